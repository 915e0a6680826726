pub use self::ui_manager::UiManager;

mod components;
mod pages;
mod ui_manager;
