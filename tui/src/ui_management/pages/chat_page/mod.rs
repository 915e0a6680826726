pub use self::chat_page::ChatPage;

#[allow(clippy::module_inception)]
mod chat_page;
mod components;
