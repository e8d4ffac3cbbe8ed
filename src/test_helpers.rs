use std::sync::Once;

static INIT: Once = Once::new();

/// Route the crate's `log` output through `env_logger`, honouring
/// `RUST_LOG`. Safe to call from every test.
pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}
