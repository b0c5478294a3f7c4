use adw::Application;
use adw::prelude::*;
use simple_chat_gtk::reply::ReplyScheduler;
use simple_chat_gtk::storage::KeyValueStore;
use simple_chat_gtk::{Settings, TimelineStore};

use crate::ui::chat_view::ChatView;

pub fn show_main_window(app: &Application, storage: Box<dyn KeyValueStore>, settings: &Settings) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title(settings.counterpart_name.as_str())
        .default_width(420)
        .default_height(720)
        .build();

    let store = TimelineStore::initialize(storage, settings);
    let (scheduler, replies) =
        ReplyScheduler::new(settings.reply_delay(), crate::utils::RUNTIME.handle().clone());
    let chat = ChatView::new(store, scheduler, replies);

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk4::Label::new(Some(&settings.counterpart_name));
    header.set_title_widget(Some(&title));
    container.append(&header);
    container.append(&chat.widget());
    window.set_content(Some(&container));

    window.connect_close_request(move |_| {
        chat.shutdown();
        glib::Propagation::Proceed
    });
    window.present();
}
