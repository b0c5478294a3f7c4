use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::prelude::*;
use simple_chat_gtk::TimelineStore;
use simple_chat_gtk::presentation::{self, Alignment, Bubble};
use simple_chat_gtk::reply::{ReplyDue, ReplyScheduler};
use simple_chat_gtk::storage::KeyValueStore;
use tokio::sync::mpsc::UnboundedReceiver;

pub type Store = TimelineStore<Box<dyn KeyValueStore>>;

const CSS: &str = r#"
.chat-root { background-color: #0f0f0f; }
.bubble { padding: 10px; border-radius: 15px; color: #ffffff; font-size: 16px; }
.bubble.local { background-color: #007AFF; border-top-right-radius: 0; }
.bubble.counterpart { background-color: #3F3F3F; border-top-left-radius: 0; }
.timestamp { font-size: 12px; color: #666666; }
.chat-input { border-radius: 20px; background-color: #333333; color: #ffffff; }
"#;

pub struct ChatView {
    root: gtk::Box,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    entry: gtk::Entry,
    store: RefCell<Store>,
    scheduler: RefCell<ReplyScheduler>,
}

impl ChatView {
    pub fn new(
        store: Store,
        scheduler: ReplyScheduler,
        replies: UnboundedReceiver<ReplyDue>,
    ) -> Rc<Self> {
        install_css();

        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.add_css_class("chat-root");

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .hscrollbar_policy(gtk::PolicyType::Never)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 5);
        messages_box.set_margin_top(10);
        messages_box.set_margin_bottom(20);
        messages_box.set_margin_start(10);
        messages_box.set_margin_end(10);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        // Input row
        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 10);
        input_row.set_margin_top(10);
        input_row.set_margin_bottom(10);
        input_row.set_margin_start(10);
        input_row.set_margin_end(10);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message"));
        entry.add_css_class("chat-input");
        let send_btn = gtk::Button::from_icon_name("mail-send-symbolic");
        send_btn.add_css_class("flat");
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);

        let view = Rc::new(Self {
            root,
            scroller,
            messages_box,
            entry,
            store: RefCell::new(store),
            scheduler: RefCell::new(scheduler),
        });
        view.render();

        // Send actions
        {
            let weak = Rc::downgrade(&view);
            let send: Rc<dyn Fn()> = Rc::new(move || {
                if let Some(view) = weak.upgrade() {
                    view.send();
                }
            });
            {
                let send = send.clone();
                send_btn.connect_clicked(move |_| (send)());
            }
            {
                let send = send.clone();
                view.entry.connect_activate(move |_| (send)());
            }
        }

        view.listen_for_replies(replies);
        view
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Drops every reply still waiting on its timer.
    pub fn shutdown(&self) {
        self.scheduler.borrow_mut().cancel_all();
    }

    fn send(&self) {
        let text = self.entry.text().to_string();
        let Some(message) = self.store.borrow_mut().send(&text) else {
            return;
        };
        self.entry.set_text("");
        self.scheduler.borrow_mut().schedule(&message.id);
        self.render();
    }

    fn listen_for_replies(self: &Rc<Self>, mut replies: UnboundedReceiver<ReplyDue>) {
        let weak = Rc::downgrade(self);
        glib::MainContext::default().spawn_local(async move {
            while let Some(due) = replies.recv().await {
                let Some(view) = weak.upgrade() else {
                    break;
                };
                view.scheduler.borrow_mut().settle(&due.trigger_id);
                let delivered = view.store.borrow_mut().deliver_reply();
                if delivered.is_some() {
                    view.render();
                }
            }
        });
    }

    fn render(&self) {
        while let Some(child) = self.messages_box.first_child() {
            self.messages_box.remove(&child);
        }
        {
            let store = self.store.borrow();
            for bubble in presentation::bubbles(store.messages()) {
                self.messages_box.append(&bubble_widget(&bubble));
            }
        }
        // the adjustment only grows once the new rows are allocated
        let scroller = self.scroller.clone();
        glib::idle_add_local_once(move || {
            let adj = scroller.vadjustment();
            adj.set_value(adj.upper());
        });
    }
}

fn bubble_widget(bubble: &Bubble<'_>) -> gtk::Widget {
    let container = gtk::Box::new(gtk::Orientation::Vertical, 2);
    let (align, side) = match bubble.alignment {
        Alignment::End => {
            container.set_margin_start(80);
            (gtk::Align::End, "local")
        }
        Alignment::Start => {
            container.set_margin_end(80);
            (gtk::Align::Start, "counterpart")
        }
    };
    container.set_halign(align);

    if let Some(clock) = &bubble.timestamp {
        let stamp = gtk::Label::new(Some(clock));
        stamp.add_css_class("timestamp");
        stamp.set_halign(align);
        container.append(&stamp);
    }

    let text = gtk::Label::new(Some(&bubble.message.text));
    text.set_wrap(true);
    text.set_wrap_mode(gtk::pango::WrapMode::WordChar);
    text.set_xalign(0.0);
    text.set_selectable(true);
    text.set_halign(align);
    text.add_css_class("bubble");
    text.add_css_class(side);
    container.append(&text);

    container.upcast()
}

fn install_css() {
    let provider = gtk::CssProvider::new();
    provider.load_from_data(CSS);
    if let Some(display) = gtk::gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
