//! Checks the diagnostics emitted through `tracing`.

use std::{
    io,
    sync::{Arc, Mutex},
};

use dynreflect::{Lookup, Registry, RegistryOptions};

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture(run: impl FnOnce()) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, run);
    capture.contents()
}

#[test]
fn test_build_and_dispatch_are_logged() {
    let output = capture(|| {
        let registry = Registry::builder()
            .options(RegistryOptions {
                lookup: Lookup::Indexed,
                ..RegistryOptions::default()
            })
            .with_primitives()
            .function("double", |value: i64| value * 2)
            .build();

        let mut args = [registry.wrap(21i64)];
        let result = registry.call_function("double", &mut args).unwrap();
        assert_eq!(result.downcast_ref::<i64>(), Some(&42));
    });

    assert!(output.contains("registry built"), "{output}");
    assert!(output.contains("name index built"), "{output}");
    assert!(output.contains("calling function"), "{output}");
    assert!(output.contains("double"), "{output}");
}

#[test]
fn test_failures_are_not_logged() {
    let output = capture(|| {
        let registry = Registry::builder().with_primitives().build();
        registry.call_function("missing", &mut []).unwrap_err();
    });

    assert!(output.contains("registry built"), "{output}");
    assert!(!output.contains("missing"), "{output}");
}
