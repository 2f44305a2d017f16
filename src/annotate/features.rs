use async_trait::async_trait;
use rand::Rng;

use crate::{
    annotate::{AnnotationRequest, Annotator, FALLBACK_SUMMARY},
    spotify::{SpotifyClient, tracks},
    types::{AudioFeatures, Track},
};

/// Builds the explanation from the track's audio features.
///
/// When the feature lookup fails the summary is built from
/// [`AudioFeatures::default`] instead.
pub struct FeatureAnnotator {
    client: SpotifyClient,
}

impl FeatureAnnotator {
    pub fn new(client: SpotifyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Annotator for FeatureAnnotator {
    async fn annotate(&self, request: AnnotationRequest<'_>) -> String {
        let features =
            match tracks::fetch_audio_features(&self.client, request.access_token, &request.track.id)
                .await
            {
                Ok(features) => features,
                Err(e) => {
                    log::warn!("audio features unavailable for {}: {}", request.track.id, e);
                    AudioFeatures::default()
                }
            };

        let summary = generate_summary(request.track, &features);
        if summary.trim().is_empty() {
            FALLBACK_SUMMARY.to_string()
        } else {
            summary
        }
    }
}

struct Descriptors {
    energy: &'static str,
    mood: &'static str,
    tempo: &'static str,
    /// energy, mood and whichever optional traits apply
    traits: Vec<&'static str>,
}

impl Descriptors {
    fn from_features(f: &AudioFeatures) -> Self {
        let energy = if f.energy > 0.7 {
            "high-energy"
        } else if f.energy < 0.4 {
            "laid-back"
        } else {
            "mid-tempo"
        };
        let mood = if f.valence > 0.7 {
            "uplifting"
        } else if f.valence < 0.4 {
            "introspective"
        } else {
            "balanced"
        };
        let tempo = if f.tempo > 120.0 {
            "fast-paced"
        } else if f.tempo < 90.0 {
            "slower"
        } else {
            "moderate"
        };

        let mut traits = vec![energy, mood];
        if f.danceability > 0.7 {
            traits.push("danceable rhythms");
        }
        if f.acousticness > 0.6 {
            traits.push("acoustic elements");
        }
        if f.instrumentalness > 0.5 {
            traits.push("instrumental sections");
        }

        Self {
            energy,
            mood,
            tempo,
            traits,
        }
    }
}

const TEMPLATE_COUNT: usize = 4;

/// Picks one of the summary templates at random.
pub fn generate_summary(track: &Track, features: &AudioFeatures) -> String {
    let index = rand::rng().random_range(0..TEMPLATE_COUNT);
    render(index, track, features)
}

fn render(index: usize, track: &Track, features: &AudioFeatures) -> String {
    let artist = track.primary_artist().unwrap_or("This artist");
    let d = Descriptors::from_features(features);
    let traits = d.traits.join(" and ");

    match index % TEMPLATE_COUNT {
        0 => {
            let mut text = format!(
                "This {} track by {} matches your preference for {} music with {} beats.",
                d.energy, artist, d.mood, d.tempo
            );
            if let Some((last, rest)) = d.traits.split_last().filter(|_| d.traits.len() > 2) {
                text.push_str(&format!(
                    " You'll appreciate its {} and {}.",
                    rest.join(", "),
                    last
                ));
            }
            text
        }
        1 => format!(
            "Based on your listening history, you might enjoy this {} song that features {}'s signature style. The {} production and {} rhythm align with other tracks you frequently play.",
            d.mood, artist, d.energy, d.tempo
        ),
        2 => format!(
            "{}'s {} approach in this track complements your taste for {} music. The {} should resonate with your musical preferences.",
            artist, d.energy, d.mood, traits
        ),
        _ => format!(
            "Your playlist history suggests you enjoy {} tracks like this one. {} delivers the {} that appear in many of your favorite songs.",
            d.mood, artist, traits
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExternalUrls, TrackAlbum, TrackArtist};

    fn track(artist: Option<&str>) -> Track {
        Track {
            id: "t1".into(),
            name: "Song".into(),
            artists: artist
                .map(|name| {
                    vec![TrackArtist {
                        id: None,
                        name: name.into(),
                    }]
                })
                .unwrap_or_default(),
            album: TrackAlbum {
                name: "Album".into(),
                images: Vec::new(),
            },
            preview_url: None,
            external_urls: ExternalUrls::default(),
        }
    }

    #[test]
    fn test_descriptors_thresholds() {
        let features = AudioFeatures {
            energy: 0.9,
            valence: 0.2,
            tempo: 80.0,
            danceability: 0.8,
            acousticness: 0.7,
            instrumentalness: 0.6,
        };
        let d = Descriptors::from_features(&features);
        assert_eq!(d.energy, "high-energy");
        assert_eq!(d.mood, "introspective");
        assert_eq!(d.tempo, "slower");
        assert_eq!(d.traits.len(), 5);
    }

    #[test]
    fn test_default_features_are_middle_of_the_road() {
        let d = Descriptors::from_features(&AudioFeatures::default());
        assert_eq!(d.energy, "mid-tempo");
        assert_eq!(d.mood, "balanced");
        assert_eq!(d.tempo, "moderate");
        assert_eq!(d.traits, vec!["mid-tempo", "balanced"]);
    }

    #[test]
    fn test_every_template_names_the_artist() {
        let t = track(Some("Björk"));
        for i in 0..TEMPLATE_COUNT {
            let text = render(i, &t, &AudioFeatures::default());
            assert!(text.contains("Björk"), "template {} missing artist: {}", i, text);
        }
    }

    #[test]
    fn test_missing_artist_uses_placeholder() {
        let text = render(1, &track(None), &AudioFeatures::default());
        assert!(text.contains("This artist"));
    }

    #[test]
    fn test_generate_summary_not_empty() {
        assert!(!generate_summary(&track(Some("A")), &AudioFeatures::default()).is_empty());
    }
}
