//! The game's view: plain helper-built trees, keyed where lists live.

use arbor_core::VNode;
use arbor_core::attribute::{class, id};
use arbor_core::event::on_click;
use arbor_core::html::{button, div, h1, h2, li, p, span, text, ul};
use arbor_core::vnode::keyed;

use crate::game::{Game, Msg, Screen};

pub fn view(game: &Game) -> VNode<Msg> {
    match game.screen {
        Screen::Menu => menu(),
        Screen::Playing => playing(game),
        Screen::Victory => terminal(game, "You win!"),
        Screen::Defeat => terminal(game, "You lose."),
    }
}

fn menu() -> VNode<Msg> {
    div(
        vec![class("screen menu")],
        vec![
            h1(vec![], vec![text("Bag of Orbs")]),
            p(
                vec![],
                vec![text("Pull orbs, reach the milestone, survive.")],
            ),
            button(
                vec![id("start"), on_click(Msg::Start)],
                vec![text("Play")],
            ),
        ],
    )
}

fn playing(game: &Game) -> VNode<Msg> {
    div(
        vec![class("screen playing")],
        vec![
            stats(game),
            button(
                vec![id("pull"), on_click(Msg::Pull)],
                vec![text(format!("Pull ({} left)", game.bag.len()))],
            ),
            draw_log(game),
        ],
    )
}

fn stats(game: &Game) -> VNode<Msg> {
    let stat = |label: &str, value: String| {
        span(
            vec![class("stat")],
            vec![text(format!("{label}: {value}"))],
        )
    };
    div(
        vec![class("stats")],
        vec![
            stat("health", game.health.to_string()),
            stat("points", game.points.to_string()),
            stat("multiplier", format!("x{}", game.multiplier)),
            stat("milestone", game.milestone.to_string()),
        ],
    )
}

fn draw_log(game: &Game) -> VNode<Msg> {
    ul(
        vec![class("draws")],
        keyed(
            game.draws
                .iter()
                .map(|draw| {
                    (
                        format!("draw-{}", draw.id),
                        li(vec![], vec![text(draw.orb.label())]),
                    )
                })
                .collect(),
        ),
    )
}

fn terminal(game: &Game, title: &str) -> VNode<Msg> {
    div(
        vec![class("screen terminal")],
        vec![
            h1(vec![], vec![text(title)]),
            h2(
                vec![],
                vec![text(format!(
                    "{} points against a milestone of {}",
                    game.points, game.milestone
                ))],
            ),
            button(
                vec![id("restart"), on_click(Msg::Restart)],
                vec![text("Play again")],
            ),
        ],
    )
}
