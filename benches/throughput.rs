use bridgeapi::params::{Args, Param};
use bridgeapi::router::{RouteSpec, Router};
use bridgeapi::{BridgeConfig, Dispatcher, Envelope, Method};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::hint::black_box;

fn ok(_: Args) -> anyhow::Result<Value> {
    Ok(Value::Null)
}

fn zoo_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::get("/animals").handle(ok),
        RouteSpec::post("/animals").handle(ok),
        RouteSpec::get("/animals/:id")
            .param(Param::path("id").of::<i64>())
            .handle(|mut args| Ok(json!({ "id": args.require::<i64>(0)? }))),
        RouteSpec::put("/animals/:id").handle(ok),
        RouteSpec::patch("/animals/:id").handle(ok),
        RouteSpec::delete("/animals/:id").handle(ok),
        RouteSpec::get("/animals/:id/toys/:toy_id").handle(ok),
        RouteSpec::get("/:category/animals/:id/habitats/:habitat_id/sections/:section_id").handle(ok),
        RouteSpec::post("/inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/:batch_id")
            .param(Param::path("item_id").of::<u32>())
            .param(Param::query("note").of::<String>())
            .param(Param::body::<Value>())
            .handle(|mut args| {
                let item: u32 = args.require(0)?;
                let body: Value = args.require(2)?;
                Ok(json!({ "item": item, "body": body }))
            }),
        RouteSpec::get("/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i").handle(ok),
        RouteSpec::get("/health").handle(ok),
    ]
}

fn bench_route_throughput(c: &mut Criterion) {
    let mut router = Router::new();
    router.register("/zoo", zoo_routes());
    c.bench_function("route_match", |b| {
        let test_paths = [
            (Method::Get, "/zoo/animals/123"),
            (Method::Get, "/zoo/animals/123/toys/456"),
            (Method::Get, "/zoo/cats/animals/123/habitats/88/sections/5"),
            (Method::Post, "/zoo/inventory/1/feeds/2/items/3/batches/4"),
            (Method::Get, "/zoo/complex/1/2/3/4/5/6/7/8/9"),
            (Method::Get, "/zoo/missing/route"),
        ];
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                let res = router.route(*method, path);
                black_box(&res);
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let quiet = BridgeConfig {
        measure_execution: false,
        ..BridgeConfig::default()
    };
    let dispatcher = Dispatcher::builder()
        .with_config(&quiet)
        .register_routes("/zoo", zoo_routes())
        .build();

    c.bench_function("routing_request_path_variable", |b| {
        b.iter(|| {
            black_box(dispatcher.routing_request(
                "/zoo/animals/42",
                Method::Get,
                HashMap::new(),
                Value::Null,
            ))
        })
    });

    let envelope = Envelope::new(
        Method::Post,
        "/zoo/inventory/1/feeds/2/items/3/batches/4?note=fresh%20hay",
    )
    .with_body(json!({"qty": 12, "unit": "kg"}))
    .to_json()
    .unwrap_or_default();
    c.bench_function("bridge_request_full", |b| {
        b.iter(|| black_box(dispatcher.bridge_request(black_box(&envelope))))
    });
}

criterion_group!(benches, bench_route_throughput, bench_dispatch);
criterion_main!(benches);
