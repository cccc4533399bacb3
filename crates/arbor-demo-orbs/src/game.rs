//! Game rules: the model, the messages, and the pure update step.
//!
//! A run starts with a bag of orbs and a points milestone. Each pull draws
//! one orb at random and applies it; the run ends when health reaches zero
//! (defeat) or the bag empties (victory if the milestone was met, defeat
//! otherwise).

use arbor_runtime::{App, Effect};

use crate::view;

/// One orb in the bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orb {
    /// Scores `n × multiplier` points.
    Point(u32),
    /// Costs `n` health.
    Damage(u32),
    /// Restores `n` health.
    Heal(u32),
    /// Raises the multiplier by one.
    Multiplier,
}

impl Orb {
    /// Short label for the draw log.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Point(n) => format!("+{n} points"),
            Self::Damage(n) => format!("-{n} health"),
            Self::Heal(n) => format!("+{n} health"),
            Self::Multiplier => "multiplier up".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Start,
    Pull,
    Restart,
}

/// Run parameters; `Default` gives the standard level.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bag: Vec<Orb>,
    pub health: u32,
    pub milestone: u32,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bag: standard_bag(),
            health: 5,
            milestone: 12,
            seed: 0x9E37_79B9_7F4A_7C15,
        }
    }
}

#[must_use]
fn standard_bag() -> Vec<Orb> {
    vec![
        Orb::Point(1),
        Orb::Point(2),
        Orb::Point(3),
        Orb::Point(5),
        Orb::Damage(1),
        Orb::Damage(2),
        Orb::Heal(1),
        Orb::Multiplier,
    ]
}

/// xorshift64; deterministic per seed, plenty for drawing orbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift.
        Self(if seed == 0 { 1 } else { seed })
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

/// One drawn orb, kept for the keyed draw log.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub id: u32,
    pub orb: Orb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub screen: Screen,
    pub bag: Vec<Orb>,
    pub health: u32,
    pub points: u32,
    pub multiplier: u32,
    pub milestone: u32,
    pub draws: Vec<Draw>,
    config: Config,
    rng: Rng,
}

impl Game {
    fn fresh_run(config: &Config) -> Self {
        Self {
            screen: Screen::Playing,
            bag: config.bag.clone(),
            health: config.health,
            points: 0,
            multiplier: 1,
            milestone: config.milestone,
            draws: Vec::new(),
            config: config.clone(),
            rng: Rng::new(config.seed),
        }
    }

    fn pull(&mut self) {
        if self.screen != Screen::Playing || self.bag.is_empty() {
            return;
        }
        let at = self.rng.below(self.bag.len());
        let orb = self.bag.remove(at);
        tracing::debug!(?orb, remaining = self.bag.len(), "pulled an orb");
        match orb {
            Orb::Point(n) => self.points += n * self.multiplier,
            Orb::Damage(n) => self.health = self.health.saturating_sub(n),
            Orb::Heal(n) => self.health += n,
            Orb::Multiplier => self.multiplier += 1,
        }
        self.draws.push(Draw {
            id: self.draws.len() as u32,
            orb,
        });

        if self.health == 0 {
            self.screen = Screen::Defeat;
        } else if self.bag.is_empty() {
            self.screen = if self.points >= self.milestone {
                Screen::Victory
            } else {
                Screen::Defeat
            };
        }
    }
}

impl App for Game {
    type Msg = Msg;
    type Flags = Config;

    fn init(config: Config) -> (Self, Effect<Msg>) {
        let game = Self {
            screen: Screen::Menu,
            bag: Vec::new(),
            health: 0,
            points: 0,
            multiplier: 1,
            milestone: config.milestone,
            draws: Vec::new(),
            config,
            rng: Rng::new(1),
        };
        (game, Effect::none())
    }

    fn update(&mut self, msg: Msg) -> Effect<Msg> {
        match msg {
            Msg::Start => {
                if self.screen == Screen::Menu {
                    *self = Self::fresh_run(&self.config.clone());
                }
            }
            Msg::Pull => self.pull(),
            Msg::Restart => {
                let config = self.config.clone();
                *self = Self::fresh_run(&config);
            }
        }
        Effect::none()
    }

    fn view(&self) -> arbor_core::VNode<Msg> {
        view::view(self)
    }
}
