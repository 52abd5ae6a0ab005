pub mod dates_controller;

pub use dates_controller::{DatesController, DatesState, UiMessage};
