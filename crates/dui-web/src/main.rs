#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Browser binary for the dui widget toolkit. Natively it only explains where to run it.

#[cfg(target_arch = "wasm32")]
fn main() -> Result<(), std::io::Error> {
    dui_web::run();
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
const NATIVE_NOTICE: &str = "dui-web binds widgets to a live page and has no native mode; \
serve it with `trunk serve` and open the page in a browser.";

#[cfg(not(target_arch = "wasm32"))]
fn write_notice(out: &mut impl std::io::Write) -> std::io::Result<()> {
    writeln!(out, "{NATIVE_NOTICE}")
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), std::io::Error> {
    write_notice(&mut std::io::stderr().lock())
}
