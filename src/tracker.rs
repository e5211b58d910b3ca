use gtk::prelude::*;
use gtk::{glib, Align, Label, Orientation};
use libshumate::prelude::{LocationExt, MarkerExt};
use std::rc::Rc;

use crate::config::Settings;
use crate::data::LookupResult;
use crate::display::{local_time_at, MapView, SummaryPanel};
use crate::error::ConfigError;
use crate::ipify::GeoLookup;
use crate::lookup::{LookupController, Transition};

/// Widgets the lookup results are rendered into.
#[derive(Clone)]
struct TrackerWidgets {
    toasts: libadwaita::ToastOverlay,
    panel: gtk::Box,
    ip_value: Label,
    city_value: Label,
    timezone_value: Label,
    isp_value: Label,
    map: libshumate::SimpleMap,
    marker_layer: Option<libshumate::MarkerLayer>,
    zoom: f64,
}

pub fn create_tracker_view<C: GeoLookup + 'static>(
    controller: Rc<LookupController<C>>,
    settings: &Settings,
) -> gtk::Widget {
    let toasts = libadwaita::ToastOverlay::new();

    let container = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .build();

    // Search header
    let header = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(18)
        .margin_top(24)
        .margin_bottom(24)
        .margin_start(24)
        .margin_end(24)
        .halign(Align::Center)
        .build();
    header.add_css_class("tracker-header");

    let title = Label::builder()
        .label("IP Address Tracker")
        .build();
    title.add_css_class("title-1");
    header.append(&title);

    let search_row = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .width_request(420)
        .build();
    search_row.add_css_class("linked");

    let search_entry = gtk::Entry::builder()
        .placeholder_text("Search for any IP address or domain")
        .hexpand(true)
        .build();
    search_entry.add_css_class("search-field");

    let search_button = gtk::Button::builder()
        .icon_name("go-next-symbolic")
        .tooltip_text("Look up")
        .build();
    search_button.add_css_class("search-button");

    search_row.append(&search_entry);
    search_row.append(&search_button);
    header.append(&search_row);
    container.append(&header);

    // Summary panel, hidden until the first result arrives
    let panel = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .homogeneous(true)
        .spacing(12)
        .margin_start(24)
        .margin_end(24)
        .margin_bottom(12)
        .visible(false)
        .build();
    panel.add_css_class("summary-panel");

    let ip_value = append_panel_column(&panel, "IP ADDRESS");
    let city_value = append_panel_column(&panel, "LOCATION");
    let timezone_value = append_panel_column(&panel, "TIMEZONE");
    let isp_value = append_panel_column(&panel, "ISP");
    container.append(&panel);

    // Map, also hidden until there is something to center on
    let map = libshumate::SimpleMap::new();
    let map_source = libshumate::RasterRenderer::from_url(&settings.tile_url);
    map.set_map_source(Some(&map_source));

    let marker_layer = if let Some(map_view) = map.map() {
        if let Some(viewport) = map_view.viewport() {
            let marker_layer = libshumate::MarkerLayer::new(&viewport);
            map_view.add_layer(&marker_layer);
            viewport.set_min_zoom_level(2);
            viewport.set_max_zoom_level(18);
            Some(marker_layer)
        } else {
            None
        }
    } else {
        None
    };
    if marker_layer.is_none() {
        log::warn!("Map has no viewport; markers will not be shown");
    }

    map.set_vexpand(true);
    map.set_hexpand(true);
    map.set_visible(false);
    container.append(&map);

    toasts.set_child(Some(&container));

    let widgets = TrackerWidgets {
        toasts: toasts.clone(),
        panel,
        ip_value,
        city_value,
        timezone_value,
        isp_value,
        map,
        marker_layer,
        zoom: settings.zoom,
    };

    // Every keystroke updates the query; nothing is looked up until submit
    let controller_for_changes = controller.clone();
    search_entry.connect_changed(move |entry| {
        controller_for_changes.update_query(&entry.text());
    });

    // Enter in the entry
    let controller_for_search = controller.clone();
    let widgets_for_search = widgets.clone();
    search_entry.connect_activate(move |_| {
        let controller = controller_for_search.clone();
        let widgets = widgets_for_search.clone();
        glib::spawn_future_local(async move {
            let transition = controller.on_enter_key().await;
            apply_transition(&widgets, transition);
        });
    });

    let controller_for_click = controller.clone();
    let widgets_for_click = widgets.clone();
    search_button.connect_clicked(move |_| {
        let controller = controller_for_click.clone();
        let widgets = widgets_for_click.clone();
        glib::spawn_future_local(async move {
            let transition = controller.on_submit_click().await;
            apply_transition(&widgets, transition);
        });
    });

    // Seed lookup, once
    glib::spawn_future_local(async move {
        if let Some(transition) = controller.start().await {
            apply_transition(&widgets, transition);
        }
    });

    toasts.upcast()
}

/// Shown instead of the tracker when the API key is not configured.
pub fn create_missing_key_view(error: &ConfigError) -> gtk::Widget {
    let page = libadwaita::StatusPage::builder()
        .icon_name("dialog-warning-symbolic")
        .title("No API Key")
        .description(format!(
            "{}.\nGet a free key at geo.ipify.org and restart the tracker.",
            error
        ))
        .vexpand(true)
        .build();
    page.upcast()
}

fn append_panel_column(panel: &gtk::Box, heading: &str) -> Label {
    let column = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(6)
        .margin_top(16)
        .margin_bottom(16)
        .build();

    let heading_label = Label::builder()
        .label(heading)
        .xalign(0.0)
        .build();
    heading_label.add_css_class("panel-heading");
    heading_label.add_css_class("dim-label");
    column.append(&heading_label);

    let value_label = Label::builder()
        .xalign(0.0)
        .wrap(true)
        .selectable(true)
        .build();
    value_label.add_css_class("panel-value");
    column.append(&value_label);

    panel.append(&column);
    value_label
}

fn apply_transition(widgets: &TrackerWidgets, transition: Transition) {
    match transition {
        Transition::Applied(result) => render_result(widgets, &result),
        Transition::Failed(e) => {
            let toast = libadwaita::Toast::new(&e.summary());
            toast.set_timeout(4);
            widgets.toasts.add_toast(toast);
        }
        Transition::Stale => {}
    }
}

/// Panel and map are both derived from the one result passed in.
fn render_result(widgets: &TrackerWidgets, result: &LookupResult) {
    let (Some(panel), Some(map_view)) = (
        SummaryPanel::render(Some(result)),
        MapView::render(Some(result), widgets.zoom),
    ) else {
        return;
    };

    widgets.ip_value.set_label(&panel.ip);
    widgets.city_value.set_label(&panel.city);
    widgets.timezone_value.set_label(&panel.timezone);
    widgets.isp_value.set_label(&panel.isp);
    widgets.panel.set_visible(true);

    widgets.map.set_visible(true);
    if let Some(map) = widgets.map.map() {
        let (lat, lng) = map_view.center;
        map.go_to_full(lat, lng, map_view.zoom);
    }

    if let Some(ref layer) = widgets.marker_layer {
        layer.remove_all();
        add_result_marker(layer, result, &map_view);
    }
}

fn add_result_marker(marker_layer: &libshumate::MarkerLayer, result: &LookupResult, map_view: &MapView) {
    let popover = gtk::Popover::builder().build();
    popover.add_css_class("map-popover");

    let popover_box = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(6)
        .margin_top(10)
        .margin_bottom(10)
        .margin_start(10)
        .margin_end(10)
        .build();

    for line in map_view.marker.popup.lines() {
        let label = Label::builder()
            .label(line)
            .xalign(0.0)
            .build();
        popover_box.append(&label);
    }

    // Local time at the location, ticking while the marker exists
    let time_label = Label::builder()
        .label("--:--:--")
        .xalign(0.0)
        .build();
    time_label.add_css_class("monospace");
    time_label.add_css_class("dim-label");
    popover_box.append(&time_label);

    let offset = result.timezone.clone();
    let update_time = {
        let time_label = time_label.downgrade();
        move || {
            let Some(label) = time_label.upgrade() else {
                return glib::ControlFlow::Break;
            };
            match local_time_at(&offset, chrono::Utc::now()) {
                Some(time) => label.set_label(&format!("Local time {}", time)),
                None => label.set_visible(false),
            }
            glib::ControlFlow::Continue
        }
    };
    update_time();
    glib::timeout_add_seconds_local(1, update_time);

    let open_button = gtk::Button::builder()
        .label("Open in OpenStreetMap")
        .build();
    open_button.add_css_class("flat");
    let link = map_view.osm_link();
    open_button.connect_clicked(move |_| {
        if let Err(e) = open::that(&link) {
            log::error!("Failed to open URL: {}", e);
        }
    });
    popover_box.append(&open_button);

    popover.set_child(Some(&popover_box));

    let marker_button = gtk::MenuButton::builder()
        .icon_name("mark-location-symbolic")
        .popover(&popover)
        .build();
    marker_button.add_css_class("map-marker");

    let marker = libshumate::Marker::new();
    marker.set_child(Some(&marker_button));
    marker.set_location(map_view.marker.lat, map_view.marker.lng);
    marker_layer.add_marker(&marker);

    log::debug!(
        "Marker placed for {} at ({}, {})",
        result.ip,
        map_view.marker.lat,
        map_view.marker.lng
    );
}
