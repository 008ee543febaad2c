//! Extraction of addressing metadata from the upgrade request.
//!
//! A client connects to `/<namespace>/<roomId>?sessionId=...&token=...`.
//! The room id is the last path segment (with at least one segment
//! before it), the session id and token are query parameters. All of
//! it is optional at this layer: a request that carries nothing usable
//! still produces a `ConnectRequest`, and the handshake above decides
//! what the missing pieces mean.

/// The addressing a client presented when it connected.
///
/// Fields stay raw strings here. The transport layer doesn't know what
/// a room or a session IS, it only knows where the client said it was
/// going. Ids are sanitized to the URL-safe charset; anything else is
/// treated as absent. The token is passed through untouched (JWTs
/// contain dots).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectRequest {
    pub room_id: Option<String>,
    pub session_id: Option<String>,
    pub token: Option<String>,
}

impl ConnectRequest {
    /// Parses a request path and optional query string.
    pub fn parse(path: &str, query: Option<&str>) -> Self {
        let room_id = parse_room_id_from_path(path);
        let session_id = query
            .and_then(|q| parse_query_param(q, "sessionId"))
            .and_then(|s| sanitize_segment(&s));
        let token = query.and_then(|q| parse_query_param(q, "token"));
        Self {
            room_id,
            session_id,
            token,
        }
    }
}

/// The room id is the final path segment, and it must be preceded by a
/// namespace segment: `/lobby/r1` yields `r1`, while a bare `/r1`
/// yields nothing. Both segments are restricted to `[A-Za-z0-9_-]`.
fn parse_room_id_from_path(path: &str) -> Option<String> {
    let mut segments = path.rsplit('/');
    let last = segments.next()?;
    let namespace = segments.next()?;
    sanitize_segment(namespace)?;
    sanitize_segment(last)
}

fn parse_query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key && !v.is_empty()).then(|| v.to_string())
    })
}

fn sanitize_segment(input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    if input
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        Some(input.to_string())
    } else {
        None
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Path parsing
    // =====================================================================

    #[test]
    fn test_parse_extracts_room_from_namespaced_path() {
        let req = ConnectRequest::parse("/lobby/r1", None);
        assert_eq!(req.room_id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_parse_uses_last_two_segments_of_longer_path() {
        // Deployments behind a path prefix still address rooms by the
        // trailing pair.
        let req = ConnectRequest::parse("/game/v2/lobby/abc_123", None);
        assert_eq!(req.room_id.as_deref(), Some("abc_123"));
    }

    #[test]
    fn test_parse_rejects_single_segment_path() {
        // A room id needs a namespace in front of it.
        let req = ConnectRequest::parse("/r1", None);
        assert!(req.room_id.is_none());
    }

    #[test]
    fn test_parse_rejects_root_path() {
        let req = ConnectRequest::parse("/", None);
        assert!(req.room_id.is_none());
    }

    #[test]
    fn test_parse_rejects_trailing_slash() {
        let req = ConnectRequest::parse("/lobby/r1/", None);
        assert!(req.room_id.is_none());
    }

    #[test]
    fn test_parse_rejects_room_with_invalid_chars() {
        let req = ConnectRequest::parse("/lobby/r1%20x", None);
        assert!(req.room_id.is_none());
    }

    #[test]
    fn test_parse_allows_underscore_and_dash() {
        let req = ConnectRequest::parse("/lobby_2/r-1_a", None);
        assert_eq!(req.room_id.as_deref(), Some("r-1_a"));
    }

    // =====================================================================
    // Query parsing
    // =====================================================================

    #[test]
    fn test_parse_extracts_session_id_and_token() {
        let req = ConnectRequest::parse(
            "/lobby/r1",
            Some("sessionId=k3X9dQm2a&token=aa.bb.cc"),
        );
        assert_eq!(req.session_id.as_deref(), Some("k3X9dQm2a"));
        assert_eq!(req.token.as_deref(), Some("aa.bb.cc"));
    }

    #[test]
    fn test_parse_missing_query_yields_no_session() {
        let req = ConnectRequest::parse("/lobby/r1", None);
        assert!(req.session_id.is_none());
        assert!(req.token.is_none());
    }

    #[test]
    fn test_parse_empty_session_id_treated_as_absent() {
        let req = ConnectRequest::parse("/lobby/r1", Some("sessionId="));
        assert!(req.session_id.is_none());
    }

    #[test]
    fn test_parse_session_id_with_invalid_chars_treated_as_absent() {
        let req =
            ConnectRequest::parse("/lobby/r1", Some("sessionId=a%3Bb"));
        assert!(req.session_id.is_none());
    }

    #[test]
    fn test_parse_ignores_unknown_query_params() {
        let req = ConnectRequest::parse(
            "/lobby/r1",
            Some("debug=1&sessionId=s1&foo=bar"),
        );
        assert_eq!(req.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_parse_token_preserved_verbatim() {
        // JWTs carry dots and base64url payload; the token must not be
        // run through the id charset filter.
        let jwt = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ1MSJ9.c2ln";
        let query = format!("sessionId=s1&token={jwt}");
        let req = ConnectRequest::parse("/lobby/r1", Some(&query));
        assert_eq!(req.token.as_deref(), Some(jwt));
    }
}
