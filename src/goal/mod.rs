pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::{
    create_goal, delete_goal, get_goal, list_goals, update_goal, update_goal_progress,
};
