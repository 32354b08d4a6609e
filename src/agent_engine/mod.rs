pub mod action;
pub mod decision;
pub mod engine;
pub mod feedback;
pub mod history;
pub mod loop_control;
pub mod state;
