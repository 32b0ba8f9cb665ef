//! M3U8 validation and synthetic playlists
//!
//! When an upstream answers with something that is not a live manifest, the
//! caller still gets a playable single-entry VOD playlist pointing back at
//! the source URL.

/// Header every valid M3U playlist starts with
pub const M3U_MARKER: &str = "#EXTM3U";

/// Whether `body` looks like an M3U playlist
///
/// Leading and trailing whitespace is ignored, so a BOM-less body padded with
/// blank lines still validates.
pub fn is_valid_m3u(body: &str) -> bool {
    body.trim().starts_with(M3U_MARKER)
}

/// Whether a response content type may carry a playlist
pub fn is_playlist_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("mpegurl") || content_type.contains("text")
}

/// Single-entry VOD playlist for a stream of known duration
pub fn vod_fallback(duration_secs: f64, url: &str) -> String {
    format!(
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:{:.0}\n#EXT-X-PLAYLIST-TYPE:VOD\n#EXT-X-MEDIA-SEQUENCE:0\n#EXTINF:{:.4}, video\n{}\n#EXT-X-ENDLIST",
        duration_secs, duration_secs, url
    )
}

/// Single-entry VOD playlist for a stream whose duration could not be probed
pub fn unknown_duration_fallback(url: &str) -> String {
    format!("#EXTM3U\n#EXTINF:-1, video\n#EXT-X-PLAYLIST-TYPE:VOD\n{url}\n#EXT-X-ENDLIST")
}

/// Pick the fallback playlist for a probe result
///
/// A zero or negative duration counts as unknown.
pub fn fallback_playlist(duration_secs: Option<f64>, url: &str) -> String {
    match duration_secs {
        Some(duration) if duration > 0.0 && duration.is_finite() => vod_fallback(duration, url),
        _ => unknown_duration_fallback(url),
    }
}
