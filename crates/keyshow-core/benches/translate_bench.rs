//! Criterion benchmarks for key name translation.
//!
//! Translation runs inside the low-level keyboard hook callback, which the OS
//! removes if it stalls, so every path through `translate` must stay cheap.
//!
//! Run with:
//! ```bash
//! cargo bench --package keyshow-core --bench translate_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keyshow_core::keymap::vk;
use keyshow_core::{translate, LayoutError, LayoutResolver, Modifier, Modifiers, NoLayout};

/// Resolver that always returns the same printable text, like a US layout for OEM keys.
struct FixedLayout;

impl LayoutResolver for FixedLayout {
    fn resolve(&self, _code: u32, _modifiers: Modifiers) -> Result<Option<String>, LayoutError> {
        Ok(Some(";".to_string()))
    }
}

fn bench_letter(c: &mut Criterion) {
    let ctrl = Modifiers::NONE.with(Modifier::Control);
    c.bench_function("translate_letter_with_ctrl", |b| {
        b.iter(|| translate(black_box(vk::VK_A), black_box(ctrl), &NoLayout))
    });
}

fn bench_layout_resolved(c: &mut Criterion) {
    c.bench_function("translate_oem_via_layout", |b| {
        b.iter(|| translate(black_box(vk::VK_OEM_1), Modifiers::NONE, &FixedLayout))
    });
}

fn bench_static_table(c: &mut Criterion) {
    c.bench_function("translate_function_key", |b| {
        b.iter(|| translate(black_box(vk::VK_F12), Modifiers::NONE, &NoLayout))
    });
}

fn bench_unknown_code(c: &mut Criterion) {
    c.bench_function("translate_unknown_code", |b| {
        b.iter(|| translate(black_box(9999), Modifiers::NONE, &NoLayout))
    });
}

fn bench_all_byte_codes(c: &mut Criterion) {
    c.bench_function("translate_all_256_codes", |b| {
        b.iter(|| {
            for code in 0u32..=255 {
                black_box(translate(code, Modifiers::NONE, &NoLayout));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_letter,
    bench_layout_resolved,
    bench_static_table,
    bench_unknown_code,
    bench_all_byte_codes,
);
criterion_main!(benches);
