//! Announcement text posted for every transferred file.

/// Build the announcement for an uploaded object.
///
/// `location` is the store-specific address of the object and therefore names
/// both the bucket and the key; `bytes` is the uncompressed size of the local file.
#[must_use]
pub fn announcement_text(location: &str, bytes: u64) -> String {
    format!("Uploaded `{location}` ({bytes} bytes)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announcement_names_location_and_size() {
        let location = "file:///srv/store/dumps/web-1/app/core@2024-01-02T03:04:05Z.gz";
        assert_eq!(
            announcement_text(location, 4_096),
            format!("Uploaded `{location}` (4096 bytes)")
        );
    }
}
