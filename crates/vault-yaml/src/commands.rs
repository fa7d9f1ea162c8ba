//! The two operations: write a document to the store, read one path back

use crate::document::{fields_of, SecretDocument};
use crate::dump::{dump, DumpOptions};
use crate::error::Result;
use crate::sanitize::sanitize;
use crate::store::SecretStore;
use tracing::{debug, info};

/// Write every path in `document`, in file order.
///
/// Stops at the first failure. Paths written before it stay written.
pub fn write_document<S: SecretStore + ?Sized>(
    store: &S,
    document: &SecretDocument,
) -> Result<usize> {
    let mut written = 0;
    for (path, value) in document.entries() {
        let fields = sanitize(fields_of(path, value)?);
        debug!(path, fields = fields.len(), "writing secret");
        store.write(path, &fields)?;
        written += 1;
    }
    info!(written, "document written");
    Ok(written)
}

/// Fetch `path` and render it as a YAML document
pub fn read_secret<S: SecretStore + ?Sized>(
    store: &S,
    path: &str,
    options: &DumpOptions,
) -> Result<String> {
    let fields = store.read(path)?;
    debug!(path, fields = fields.len(), "read secret");
    dump(path, &fields, options)
}
