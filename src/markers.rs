//! Map-marker projection of organisations for the client-side map widget.

use serde::Serialize;

use crate::models::Organisation;
use crate::util::html_escape;
use crate::view::organisation_path;

/// A single marker: coordinates plus the info-window fragment the map
/// widget opens when the marker is clicked.
#[derive(Debug, Clone, Serialize)]
pub struct MapMarker {
    pub lat: f64,
    pub lng: f64,
    pub infowindow: String,
}

impl MapMarker {
    /// Project an organisation onto a marker. Organisations missing either
    /// coordinate have no marker.
    pub fn for_organisation(organisation: &Organisation) -> Option<MapMarker> {
        let lat = organisation.latitude?;
        let lng = organisation.longitude?;
        Some(MapMarker {
            lat,
            lng,
            infowindow: infowindow_html(organisation),
        })
    }
}

/// Build markers for a sequence of organisations, silently omitting any
/// without both coordinates.
pub fn build_map_markers<'a, I>(organisations: I) -> Vec<MapMarker>
where
    I: IntoIterator<Item = &'a Organisation>,
{
    organisations
        .into_iter()
        .filter_map(MapMarker::for_organisation)
        .collect()
}

fn infowindow_html(organisation: &Organisation) -> String {
    let description = organisation.description.as_deref().unwrap_or("");
    format!(
        r#"<div class="infowindow" data-id="{id}"><a href="{path}">{name}</a><p>{description}</p></div>"#,
        id = html_escape(&organisation.id),
        path = organisation_path(&organisation.id),
        name = html_escape(&organisation.name),
        description = html_escape(description),
    )
}
