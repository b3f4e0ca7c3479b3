//! Turns raw odds-feed payloads into sheet rows.

pub mod odds;
pub mod props;

pub use odds::{game_id, shape_games, team_code, ShapedGames};
pub use props::{
    player_name, separate_anytime_td, shape_anytime_td, shape_props, ShapedProps, Side,
};
