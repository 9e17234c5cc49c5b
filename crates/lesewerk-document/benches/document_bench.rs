// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the lesewerk-document crate. Measures overlay
// content-stream synthesis for a realistic per-page item count.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use lesewerk_core::types::{BoundingBox, OcrItem};
use lesewerk_document::synthesize_overlay;

fn bench_overlay_synthesis(c: &mut Criterion) {
    // 300 items roughly matches a dense text page at line granularity.
    let items: Vec<OcrItem> = (0..300)
        .map(|i| {
            let y = (i / 2) as f32 * 22.0;
            let x = (i % 2) as f32 * 1200.0 + 100.0;
            OcrItem {
                text: format!("line {i} with some recognized words"),
                bbox: BoundingBox {
                    x1: x,
                    y1: y,
                    x2: x + 1000.0,
                    y2: y + 18.0,
                },
                confidence: 0.9,
            }
        })
        .collect();

    c.bench_function("synthesize_overlay (300 items)", |b| {
        b.iter(|| {
            black_box(
                synthesize_overlay(black_box(&items), 2550, 3300, 612.0, 792.0).unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_overlay_synthesis);
criterion_main!(benches);
