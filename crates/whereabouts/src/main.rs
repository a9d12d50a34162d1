mod config;
mod stdin;

use std::fmt::Write as _;
use std::sync::Arc;

use clap::Parser;
use futures_lite::StreamExt;
use macro_rules_attribute::apply;
use smol_macros::main;

use whereabouts_geocode::location::Replay;
use whereabouts_geocode::transport::isahc::Backend;
use whereabouts_geocode::{
    address, AddressComponent, Geocode, Location, ResultSet, Subscription, Watch,
};

#[apply(main!)]
async fn main(executor: Arc<async_executor::Executor<'static>>) {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,isahc=error")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = config::Args::parse();
    let options = config::load(&args).expect("failed to load options");
    let transport = Backend::new().expect("HTTP client");
    let geocode = Geocode::new(executor.clone(), transport, options);

    let geocoded = geocode.on_geocode();
    let errors = geocode.on_error();
    let watch = match args.coordinate() {
        Some(coords) => follow(&geocode, Replay::new(vec![coords])),
        None => follow(&geocode, stdin::Stdin),
    };
    report(&args.kinds, watch, geocoded, errors).await;
}

fn follow<L: Location>(geocode: &Geocode, source: L) -> Watch {
    tracing::info!(sensor = geocode.sensor(), "following location source");
    geocode.follow(source)
}

/// Print addresses for every result set until the source is exhausted.
async fn report(
    kinds: &[String],
    watch: Watch,
    mut geocoded: Subscription<ResultSet>,
    mut errors: Subscription<whereabouts_geocode::Error>,
) {
    futures_lite::future::or(
        async {
            loop {
                futures_lite::future::or(
                    async {
                        if let Some(results) = geocoded.next().await {
                            print!("{}", render(&results, kinds));
                        }
                    },
                    async {
                        if let Some(e) = errors.next().await {
                            tracing::error!(%e, "lookup rejected");
                        }
                    },
                )
                .await;
            }
        },
        watch.done(),
    )
    .await;

    // Events delivered while the last lookups were settling.
    while let Some(results) = geocoded.try_next() {
        print!("{}", render(&results, kinds));
    }
    while let Some(e) = errors.try_next() {
        tracing::error!(%e, "lookup rejected");
    }
}

/// One line per requested type, from the result set an event carried.
fn render(results: &[Arc<AddressComponent>], kinds: &[String]) -> String {
    let mut out = String::new();
    for kind in kinds {
        match address::first_by_type(results, kind) {
            Some(component) => {
                let _ = writeln!(out, "{kind}: {}", component.formatted_address());
            }
            None => {
                let _ = writeln!(out, "{kind}: (none)");
            }
        }
    }
    out
}
