// src/test_support.rs

#![allow(clippy::unwrap_used)]

use crate::core::output::Output;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A clonable sink whose contents remain readable after the output facade
/// takes ownership of one of its clones.
#[derive(Clone, Default, Debug)]
pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An output facade over captured sinks, returned together with handles
/// to read back what was written.
pub(crate) fn captured() -> (Output, SharedBuf, SharedBuf) {
    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let output = Output::new(Box::new(out.clone()), Box::new(err.clone()));
    (output, out, err)
}
