use gtk::prelude::*;
use gtk::{glib, Application};
use libadwaita::{prelude::*, ApplicationWindow, ColorScheme, HeaderBar, StyleManager, ToolbarView};
use std::rc::Rc;
use anyhow::Context;

use ip_tracker::data::APP_ID;
use ip_tracker::logging::init_logger;
use ip_tracker::tracker::{create_missing_key_view, create_tracker_view};
use ip_tracker::{IpifyClient, LookupController, Settings};

fn main() -> glib::ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }
    if let Err(e) = init_logger() {
        eprintln!("Logger already initialised: {}", e);
    }

    match run() {
        Ok(exit_code) => exit_code,
        Err(e) => {
            log::error!("{:#}", e);
            glib::ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<glib::ExitCode> {
    let settings = Rc::new(Settings::load().context("Failed to load settings")?);

    // reqwest needs a Tokio reactor; keep one entered for the app's lifetime
    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let _guard = rt.enter();

    let app = Application::builder()
        .application_id(APP_ID)
        .build();

    app.connect_activate(move |app| build_ui(app, &settings));

    let exit_code = app.run();

    drop(_guard);
    drop(rt);

    Ok(exit_code)
}

fn build_ui(app: &Application, settings: &Settings) {
    if let Some(window) = app.active_window() {
        window.present();
        return;
    }

    let style_manager = StyleManager::default();
    style_manager.set_color_scheme(ColorScheme::PreferDark);

    let content = match IpifyClient::new(settings) {
        Ok(client) => {
            let controller = Rc::new(LookupController::new(client, &settings.seed_query));
            create_tracker_view(controller, settings)
        }
        Err(e) => {
            log::error!("{}", e);
            create_missing_key_view(&e)
        }
    };

    let header_bar = HeaderBar::builder()
        .build();

    let toolbar_view = ToolbarView::builder()
        .build();
    toolbar_view.add_top_bar(&header_bar);
    toolbar_view.set_content(Some(&content));

    let window = ApplicationWindow::builder()
        .application(app)
        .title("IP Address Tracker")
        .default_width(960)
        .default_height(720)
        .build();

    let css_provider = gtk::CssProvider::new();
    css_provider.load_from_data(
        ".tracker-header .title-1 {
            letter-spacing: 0.5px;
        }
        .search-field {
            min-height: 40px;
            padding-left: 16px;
            border-radius: 20px 0 0 20px;
        }
        .search-button {
            min-height: 40px;
            min-width: 48px;
            border-radius: 0 20px 20px 0;
            background-color: @accent_bg_color;
            color: @accent_fg_color;
        }
        .summary-panel {
            background-color: @card_bg_color;
            border-radius: 12px;
            padding: 0 24px;
            box-shadow: 0 4px 12px alpha(black, 0.2);
        }
        .panel-heading {
            font-size: 11px;
            font-weight: 700;
            letter-spacing: 1px;
        }
        .panel-value {
            font-size: 20px;
            font-weight: 600;
        }
        .map-marker {
            background-color: alpha(@accent_bg_color, 0.85);
            border-radius: 16px;
            min-height: 0;
            min-width: 0;
            box-shadow: 0 2px 6px alpha(black, 0.4);
        }
        .map-marker:hover {
            background-color: @accent_bg_color;
        }
        .map-popover > contents {
            background-color: alpha(@card_bg_color, 0.95);
            border-radius: 12px;
            box-shadow: 0 4px 16px alpha(black, 0.6);
        }"
    );

    gtk::style_context_add_provider_for_display(
        &gtk::prelude::WidgetExt::display(&window),
        &css_provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );

    window.set_content(Some(&toolbar_view));
    window.present();
}
