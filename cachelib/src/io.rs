use std::fs::File;
use std::io::Read;
use std::ops::Deref;

/// The bytes of a trace file, either memory mapped or read into a buffer
pub enum TraceBytes {
    #[cfg(unix)]
    Mapped(memmap2::Mmap),
    Buffered(Vec<u8>),
}

impl Deref for TraceBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            #[cfg(unix)]
            TraceBytes::Mapped(m) => &m[..],
            TraceBytes::Buffered(b) => &b[..],
        }
    }
}

/// Opens a trace for reading. Unix systems memory map the file, elsewhere it is read into memory
pub fn get_trace_bytes(mut file: File) -> Result<TraceBytes, String> {
    let len = file.metadata().map_err(|e| format!("Couldn't read the trace file metadata: {e}"))?.len();
    // Compatibility on other systems, and zero length maps are refused on some platforms
    #[cfg(unix)]
    {
        use memmap2::{Advice, Mmap};
        if len > 0 {
            // The trace is only ever read front to back
            let m = unsafe { Mmap::map(&file) }.map_err(|e| format!("Couldn't memory map the file: {e}"))?;
            m.advise(Advice::Sequential).map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
            return Ok(TraceBytes::Mapped(m));
        }
    }
    let mut buf = Vec::with_capacity(len as usize);
    file.read_to_end(&mut buf).map_err(|e| format!("Couldn't read the trace file: {e}"))?;
    Ok(TraceBytes::Buffered(buf))
}
