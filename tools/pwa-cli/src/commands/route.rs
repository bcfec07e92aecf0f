//! Explain how the worker would handle a request.

use anyhow::{bail, Context as _, Result};
use pwa_core::{Method, Request, RequestDestination, Scope, WorkerConfig};
use pwa_worker::{classify, Route, OFFLINE_STATUS};
use serde::Serialize;

use super::RouteArgs;
use crate::context::Context;
use crate::output::route_badge;

/// What the worker does with one request.
#[derive(Debug, Serialize)]
pub struct RouteReport {
    pub url: String,
    pub route: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Sources tried in order.
    pub steps: Vec<String>,
}

/// Run the route command.
pub async fn run(args: RouteArgs, ctx: &Context) -> Result<()> {
    let scope = Scope::parse(&args.origin)
        .with_context(|| format!("Invalid origin: {}", args.origin))?;
    let url = scope
        .resolve(&args.url)
        .with_context(|| format!("Invalid URL: {}", args.url))?;
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid method: {}", args.method))?;

    let mut request = if args.navigate {
        Request::navigate(url)
    } else {
        Request::get(url)
    };
    request.method = method;
    if let Some(destination) = &args.destination {
        let parsed = RequestDestination::from_platform(destination);
        if parsed == RequestDestination::Empty && !destination.is_empty() {
            bail!("Unknown destination: {}", destination);
        }
        request = request.with_destination(parsed);
    }

    let report = explain(&request, &ctx.config.worker, &scope);

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.kv("url", &report.url);
    ctx.output.kv("route", &route_badge(report.route));
    if let Some(reason) = &report.reason {
        ctx.output.kv("reason", reason);
    }
    for (index, step) in report.steps.iter().enumerate() {
        ctx.output.list_item(&format!("{}. {}", index + 1, step));
    }

    Ok(())
}

/// Classify a request and list the sources the worker would try.
pub fn explain(request: &Request, config: &WorkerConfig, scope: &Scope) -> RouteReport {
    let url = request.url.to_string();

    if !matches!(request.url.scheme(), "http" | "https") {
        return bypass(url, format!("scheme {} is not intercepted", request.url.scheme()));
    }
    if !scope.is_same_origin(&request.url) {
        return bypass(url, "cross-origin requests are left to the browser".to_string());
    }

    let route = classify(request, config);
    let steps = match &route {
        Route::Bypass(reason) => return bypass(url, reason.to_string()),
        Route::Navigation => {
            let mut steps = vec!["network".to_string()];
            steps.extend(
                config
                    .navigation_fallbacks
                    .iter()
                    .filter_map(|path| scope.resolve(path).ok())
                    .map(|fallback| format!("cache {}", fallback)),
            );
            steps.push(format!("offline page ({})", OFFLINE_STATUS));
            steps
        }
        Route::NetworkFirst => vec!["network".to_string(), format!("cache {}", url)],
        Route::CacheFirst => vec![
            format!("cache {}", url),
            "network (stored when basic and 200)".to_string(),
            format!("cache {} again", url),
        ],
    };

    RouteReport {
        url,
        route: route.name(),
        reason: None,
        steps,
    }
}

fn bypass(url: String, reason: String) -> RouteReport {
    RouteReport {
        url,
        route: "bypass",
        reason: Some(reason),
        steps: vec!["browser default".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn scope() -> Scope {
        Scope::parse("https://app.example").unwrap()
    }

    fn url(path: &str) -> Url {
        scope().resolve(path).unwrap()
    }

    #[test]
    fn test_explain_navigation_lists_fallbacks() {
        let report = explain(&Request::navigate(url("/orders")), &WorkerConfig::default(), &scope());

        assert_eq!(report.route, "navigation");
        assert_eq!(
            report.steps,
            vec![
                "network",
                "cache https://app.example/",
                "cache https://app.example/index.html",
                "offline page (503)",
            ]
        );
    }

    #[test]
    fn test_explain_excluded_prefix() {
        let report = explain(&Request::get(url("/api/orders")), &WorkerConfig::default(), &scope());

        assert_eq!(report.route, "bypass");
        assert!(report.reason.unwrap().contains("/api/"));
    }

    #[test]
    fn test_explain_script_is_network_first() {
        let request = Request::get(url("/app.js")).with_destination(RequestDestination::Script);
        let report = explain(&request, &WorkerConfig::default(), &scope());

        assert_eq!(report.route, "network_first");
        assert_eq!(report.steps[0], "network");
    }

    #[test]
    fn test_explain_cross_origin() {
        let request = Request::get(Url::parse("https://cdn.example/logo.png").unwrap());
        let report = explain(&request, &WorkerConfig::default(), &scope());

        assert_eq!(report.route, "bypass");
        assert_eq!(report.steps, vec!["browser default"]);
    }

    #[test]
    fn test_explain_image_is_cache_first() {
        let report = explain(&Request::get(url("/logo.png")), &WorkerConfig::default(), &scope());
        assert_eq!(report.route, "cache_first");
        assert_eq!(report.steps.len(), 3);
    }
}
