//! This example replays a recorded sequence of clicks and location fixes through a map view
//! mounted on the headless widget, and prints the resulting markers.
//!
//! Usage: `cargo run --example replay [path/to/events.csv]`. Without arguments the bundled
//! `data/walk.csv` is used. Set `RUST_LOG=debug` to see every marker operation.

use anyhow::{anyhow, Context};
use approx::AbsDiffEq;
use mapview::geo::{GeolocationError, GeolocationErrorCode};
use mapview::widget::headless::{HeadlessProvider, HeadlessSurface};
use mapview::{lnglat, LngLat, LocationFix, MapConfig, MapHost};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Step {
    Load,
    Click,
    Unpin,
    Fix,
    Error,
    Clear,
}

#[derive(Debug, Deserialize)]
struct Record {
    event: Step,
    lng: Option<f64>,
    lat: Option<f64>,
    heading: Option<f64>,
}

impl Record {
    fn position(&self) -> anyhow::Result<LngLat> {
        match (self.lng, self.lat) {
            (Some(lng), Some(lat)) => Ok(lnglat!(lng, lat)),
            _ => Err(anyhow!("{:?} event without position", self.event)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let records = match std::env::args().nth(1) {
        Some(path) => {
            let file =
                std::fs::File::open(&path).with_context(|| format!("failed to open {path}"))?;
            read_records(file)?
        }
        None => read_records(include_str!("data/walk.csv").as_bytes())?,
    };

    let config = MapConfig::from_env().unwrap_or_else(|_| MapConfig::new("replay"));
    let mut host = MapHost::new(HeadlessProvider::new(), config);
    host.mount("map".to_string())?;
    let surface = host
        .provider()
        .last_surface()
        .context("widget was not created")?
        .clone();

    for record in &records {
        replay(&mut host, &surface, record)?;
    }

    print_state(&host);

    host.unmount();
    println!("Unmounted, leftovers: {:?}", surface.leftovers());

    Ok(())
}

fn read_records(reader: impl std::io::Read) -> anyhow::Result<Vec<Record>> {
    let mut reader = csv::Reader::from_reader(reader);
    let records = reader.deserialize().collect::<Result<Vec<Record>, _>>()?;
    Ok(records)
}

fn replay(
    host: &mut MapHost<HeadlessProvider>,
    surface: &HeadlessSurface,
    record: &Record,
) -> anyhow::Result<()> {
    let event = match record.event {
        Step::Load => surface.load(),
        Step::Click => surface.click(record.position()?),
        Step::Unpin => {
            let position = record.position()?;
            let pin = host
                .session()
                .context("map is not mounted")?
                .pins()
                .iter()
                .find(|pin| pin.position().abs_diff_eq(&position, 1e-9))
                .with_context(|| format!("no pin at {position:?}"))?
                .id();
            surface.click_marker(pin)
        }
        Step::Fix => surface.fix(LocationFix::new(record.position()?, record.heading)),
        Step::Error => surface.geolocate_error(GeolocationError {
            code: GeolocationErrorCode::PositionUnavailable,
            message: "replayed failure".into(),
        }),
        Step::Clear => {
            let removed = host.clear_pins();
            println!("Cleared {removed} pins");
            None
        }
    };

    if let Some(event) = event {
        host.dispatch(event);
    }

    Ok(())
}

fn print_state(host: &MapHost<HeadlessProvider>) {
    let Some(session) = host.session() else {
        return;
    };

    println!("Pins:");
    for pin in session.pins().iter() {
        println!("  {:?} at {:?}", pin.id(), pin.position());
    }

    let tracker = session.tracker();
    if let Some(location) = tracker.location() {
        println!("Location: {:?}", location.position());
    }
    if let Some(heading) = tracker.heading() {
        println!(
            "Heading: {:?}, {} degrees",
            heading.position(),
            heading.rotation()
        );
    }
    println!(
        "Fixes: {}, errors: {}",
        tracker.fix_count(),
        tracker.error_count()
    );
}
