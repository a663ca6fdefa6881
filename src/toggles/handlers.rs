//! Routes served by the feature toggle service.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::errors::SequenceError;
use crate::handler::{handler_fn, Reply};
use crate::params::{Args, ParamError, ParamKind, ParamLocation, ParamSpec};
use crate::routing::RouteDescriptor;
use crate::toggles::store::{FeatureToggleStore, NewFeature, NewStrategy};

pub const VIEW_FEATURE: &str = "ViewFeature";
pub const CREATE_FEATURE: &str = "CreateFeature";
pub const DELETE_FEATURE: &str = "DeleteFeature";
pub const CREATE_STRATEGY: &str = "CreateStrategy";

fn key(args: &Args) -> Result<String, SequenceError> {
    args.str("key").map(str::to_string).ok_or_else(|| {
        ParamError::Missing {
            name: "key".into(),
            location: ParamLocation::Path,
        }
        .into()
    })
}

/// Build the route table for `store`.
pub fn routes(store: FeatureToggleStore) -> Vec<RouteDescriptor> {
    let list = store.clone();
    let get = store.clone();
    let create = store.clone();
    let delete = store.clone();
    let strategies = store;

    vec![
        RouteDescriptor::new(
            "ping",
            Method::GET,
            "/ping",
            handler_fn(|_, _| async {
                Ok(Reply::json(json!({
                    "greeting": "pong",
                    "service": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                })))
            }),
        )
        .public(),
        RouteDescriptor::new(
            "listFeatures",
            Method::GET,
            "/features",
            handler_fn(move |args, _| {
                let store = list.clone();
                async move {
                    let enabled = args.bool("enabled");
                    let features: Vec<_> = store
                        .list()
                        .into_iter()
                        .filter(|f| enabled.map_or(true, |e| f.enabled == e))
                        .collect();
                    Reply::serialize(&features)
                }
            }),
        )
        .param(ParamSpec::query("enabled", ParamKind::Boolean))
        .permissions([VIEW_FEATURE]),
        RouteDescriptor::new(
            "getFeature",
            Method::GET,
            "/features/{key}",
            handler_fn(move |args, _| {
                let store = get.clone();
                async move { Reply::serialize(&store.get(&key(&args)?)?) }
            }),
        )
        .param(ParamSpec::path("key", ParamKind::String))
        .permissions([VIEW_FEATURE]),
        RouteDescriptor::new(
            "createFeature",
            Method::POST,
            "/features",
            handler_fn(move |args, principal| {
                let store = create.clone();
                async move {
                    let input: NewFeature = args.body_as()?;
                    let feature = store.create(input)?;
                    tracing::debug!(key = %feature.key, subject = %principal.subject, "Create request served");
                    Ok(Reply::serialize(&feature)?.with_status(StatusCode::CREATED))
                }
            }),
        )
        .json_body(true)
        .permissions([CREATE_FEATURE]),
        RouteDescriptor::new(
            "deleteFeature",
            Method::DELETE,
            "/features/{key}",
            handler_fn(move |args, _| {
                let store = delete.clone();
                async move {
                    store.delete(&key(&args)?)?;
                    Ok(Reply::empty())
                }
            }),
        )
        .param(ParamSpec::path("key", ParamKind::String))
        .permissions([DELETE_FEATURE]),
        RouteDescriptor::new(
            "createStrategy",
            Method::POST,
            "/features/{key}/strategies",
            handler_fn(move |args, _| {
                let store = strategies.clone();
                async move {
                    let input: NewStrategy = args.body_as()?;
                    let strategy = store.add_strategy(&key(&args)?, input)?;
                    Ok(Reply::serialize(&strategy)?.with_status(StatusCode::CREATED))
                }
            }),
        )
        .param(ParamSpec::path("key", ParamKind::String))
        .json_body(true)
        .permissions([CREATE_STRATEGY]),
    ]
}
