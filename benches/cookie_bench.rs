// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use agency::http::parse_set_cookie;
use agency::CookieJar;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use url::Url;

fn set_cookie_parsing_benchmark(c: &mut Criterion) {
    let headers = [
        "connect.sid=s%3Aabc.def; Path=/; HttpOnly",
        "pref=dark; Domain=example.com; Path=/app; Secure; SameSite=Lax",
        "old=; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        "ttl=1; Max-Age=3600",
    ];

    c.bench_function("parse_set_cookie", |b| {
        b.iter(|| {
            for header in &headers {
                black_box(parse_set_cookie(header).ok());
            }
        })
    });
}

fn jar_lookup_benchmark(c: &mut Criterion) {
    let jar = CookieJar::new();
    let origin = Url::parse("https://www.example.com/").unwrap();
    for i in 0..100 {
        jar.apply([format!("c{}=v{}; Path=/p{}", i, i, i % 10)], &origin);
    }
    jar.apply(["root=1; Domain=example.com"], &origin);

    let target = Url::parse("https://www.example.com/p3/page").unwrap();
    c.bench_function("cookie_header_for", |b| {
        b.iter(|| black_box(jar.cookie_header(&target)))
    });
}

criterion_group!(benches, set_cookie_parsing_benchmark, jar_lookup_benchmark);
criterion_main!(benches);
