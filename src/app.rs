use adw::Application;
use simple_chat_gtk::Settings;
use simple_chat_gtk::storage::{KeyValueStore, MemoryStore, SqliteStore};

fn open_storage(settings: &Settings) -> Box<dyn KeyValueStore> {
    let opened = match &settings.database {
        Some(path) => SqliteStore::open(path),
        None => SqliteStore::open_default(),
    };
    match opened {
        Ok(store) => Box::new(store),
        Err(e) => {
            // the chat still works, it just forgets everything on exit
            log::warn!("history storage unavailable, keeping messages in memory: {e}");
            Box::new(MemoryStore::new())
        }
    }
}

pub fn build_ui(app: &Application, settings: &Settings) {
    let storage = open_storage(settings);
    crate::ui::main_window::show_main_window(app, storage, settings);
}
