use crate::{
    config::SeedEncoding,
    error::{Error, Result},
    spotify::SpotifyClient,
    types::{RecommendationsResponse, Track},
};

/// The recommendation endpoint accepts at most five seeds.
pub const MAX_SEEDS: usize = 5;

/// Ordered, non-empty list of at most [`MAX_SEEDS`] track ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSet(Vec<String>);

impl SeedSet {
    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|s| s == id)
    }

    /// Query parameters carrying the seeds in the given wire encoding.
    pub fn query_pairs(&self, encoding: SeedEncoding) -> Vec<(&'static str, String)> {
        match encoding {
            SeedEncoding::Delimited => vec![("seed_tracks", self.0.join(","))],
            SeedEncoding::Repeated => self
                .0
                .iter()
                .map(|id| ("seed_tracks", id.clone()))
                .collect(),
        }
    }
}

/// Takes the first `min(5, len)` track ids, keeping the input order.
pub fn derive_seeds(tracks: &[Track]) -> Result<SeedSet> {
    if tracks.is_empty() {
        return Err(Error::InsufficientSeeds);
    }

    Ok(SeedSet(
        tracks
            .iter()
            .take(MAX_SEEDS)
            .map(|t| t.id.clone())
            .collect(),
    ))
}

/// Requests exactly one recommendation for `seeds` and returns it.
///
/// The upstream service is not deterministic; two calls with the same seeds
/// may return different tracks.
pub async fn resolve_recommendation(
    client: &SpotifyClient,
    token: &str,
    seeds: &SeedSet,
    market: Option<&str>,
    encoding: SeedEncoding,
) -> Result<Track> {
    let mut query = seeds.query_pairs(encoding);
    query.push(("limit", "1".to_string()));
    if let Some(market) = market {
        query.push(("market", market.to_string()));
    }

    let response: RecommendationsResponse =
        client.get_json(token, "recommendations", &query).await?;

    let track = response
        .tracks
        .into_iter()
        .next()
        .ok_or(Error::NoRecommendation)?;

    log::info!("recommendation resolved to track {}", track.id);
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExternalUrls, TrackAlbum, TrackArtist};

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Song {}", id),
            artists: vec![TrackArtist {
                id: None,
                name: "Artist".to_string(),
            }],
            album: TrackAlbum {
                name: "Album".to_string(),
                images: Vec::new(),
            },
            preview_url: None,
            external_urls: ExternalUrls::default(),
        }
    }

    fn tracks(ids: &[&str]) -> Vec<Track> {
        ids.iter().map(|id| track(id)).collect()
    }

    #[test]
    fn test_derive_seeds_empty_fails() {
        assert!(matches!(derive_seeds(&[]), Err(Error::InsufficientSeeds)));
    }

    #[test]
    fn test_derive_seeds_takes_first_five_in_order() {
        let seeds = derive_seeds(&tracks(&["a", "b", "c", "d", "e", "f", "g"])).unwrap();
        assert_eq!(seeds.ids(), &["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_derive_seeds_short_history() {
        for n in 1..MAX_SEEDS {
            let ids: Vec<String> = (0..n).map(|i| format!("t{}", i)).collect();
            let input: Vec<Track> = ids.iter().map(|id| track(id)).collect();
            let seeds = derive_seeds(&input).unwrap();
            assert_eq!(seeds.ids(), ids.as_slice());
        }
    }

    #[test]
    fn test_query_pairs_encodings() {
        let seeds = derive_seeds(&tracks(&["a", "b", "c"])).unwrap();
        assert_eq!(
            seeds.query_pairs(SeedEncoding::Delimited),
            vec![("seed_tracks", "a,b,c".to_string())]
        );
        assert_eq!(seeds.query_pairs(SeedEncoding::Repeated).len(), 3);
    }
}
