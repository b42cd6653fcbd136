//! Race track catalogue
//!
//! A track is a sequence of road pieces. Every piece is a section of the
//! grassy background set made of [`SUBSECTIONS_PER_PIECE`] screen-sized
//! images, each with its own `.road` border file.

use rand::seq::SliceRandom;
use rand::Rng;

use redneck_common::RaceTrackId;

/// Background images per road piece
pub const SUBSECTIONS_PER_PIECE: usize = 2;
/// Number of pieces in a random track
pub const RANDOM_TRACK_LENGTH: usize = 15;

/// Road piece shapes. The discriminant is the background section index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    Straight,
    LeftRight,
    RightLeft,
    SharpLeftBack,
    SharpRightBack,
    Squiggle,
    PeakLeft,
    PeakRight,
    DriftLeft,
    DriftRight,
}

impl Piece {
    pub const ALL: [Piece; 10] = [
        Piece::Straight,
        Piece::LeftRight,
        Piece::RightLeft,
        Piece::SharpLeftBack,
        Piece::SharpRightBack,
        Piece::Squiggle,
        Piece::PeakLeft,
        Piece::PeakRight,
        Piece::DriftLeft,
        Piece::DriftRight,
    ];

    /// Zero-based background section index
    pub fn section(self) -> usize {
        self as usize
    }

    /// Background quad name of a subsection (both numbers one-based)
    pub fn background_name(self, subsection: usize) -> String {
        format!("background_grassy_{}_{}", self.section() + 1, subsection + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaceTrack {
    pub id: RaceTrackId,
    pub pieces: Vec<Piece>,
    pub min_animals: u32,
    pub max_animals: u32,
    pub min_obstacles: u32,
    pub max_obstacles: u32,
}

impl RaceTrack {
    /// Catalogue entry. The random track gets a fresh layout from `rng`.
    pub fn new<R: Rng>(id: RaceTrackId, rng: &mut R) -> Self {
        use Piece::*;
        let (pieces, animals, obstacles) = match id {
            RaceTrackId::YankeeShot => (
                vec![Straight, Squiggle, DriftLeft, PeakRight, LeftRight, Straight],
                (2, 5),
                (2, 5),
            ),
            RaceTrackId::Everwhichaways => (
                vec![
                    DriftLeft, DriftRight, PeakLeft, PeakRight, Squiggle,
                    SharpLeftBack, Squiggle, SharpRightBack, LeftRight, RightLeft,
                ],
                (5, 8),
                (5, 8),
            ),
            RaceTrackId::Uhmurkin => (
                vec![
                    Straight, Squiggle, PeakLeft, LeftRight, PeakRight,
                    DriftLeft, Squiggle, RightLeft, PeakRight, Straight,
                ],
                (10, 12),
                (5, 7),
            ),
            RaceTrackId::DadgumTrakturs => (
                vec![
                    Straight, RightLeft, SharpRightBack, PeakLeft, DriftLeft, LeftRight,
                    SharpLeftBack, Squiggle, PeakRight, DriftRight, Squiggle, Squiggle,
                    PeakLeft, PeakRight, DriftLeft, Squiggle, PeakRight, Straight,
                ],
                (8, 12),
                (15, 18),
            ),
            RaceTrackId::RealBammer => (
                vec![
                    DriftLeft, DriftRight, PeakLeft, PeakRight, Squiggle,
                    LeftRight, RightLeft, SharpLeftBack, SharpRightBack, Squiggle,
                    Straight, Squiggle, PeakLeft, PeakRight, Straight,
                ],
                (15, 18),
                (15, 18),
            ),
            RaceTrackId::Wijadidja => (random_pieces(rng), (3, 18), (3, 18)),
        };
        Self {
            id,
            pieces,
            min_animals: animals.0,
            max_animals: animals.1,
            min_obstacles: obstacles.0,
            max_obstacles: obstacles.1,
        }
    }

    /// Background quad names in track order
    pub fn background_names(&self) -> Vec<String> {
        self.pieces
            .iter()
            .flat_map(|p| (0..SUBSECTIONS_PER_PIECE).map(move |s| p.background_name(s)))
            .collect()
    }
}

/// Three copies of every piece, shuffled, cut to [`RANDOM_TRACK_LENGTH`]
fn random_pieces<R: Rng>(rng: &mut R) -> Vec<Piece> {
    let mut pieces: Vec<Piece> = (0..3).flat_map(|_| Piece::ALL).collect();
    pieces.shuffle(rng);
    pieces.truncate(RANDOM_TRACK_LENGTH);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn catalogue_lengths() {
        let mut rng = StdRng::seed_from_u64(1);
        let lengths: Vec<usize> = RaceTrackId::all()
            .into_iter()
            .map(|id| RaceTrack::new(id, &mut rng).pieces.len())
            .collect();
        assert_eq!(lengths, vec![6, 10, 10, 18, 15, 15]);
    }

    #[test]
    fn spawn_ranges_are_ordered() {
        let mut rng = StdRng::seed_from_u64(1);
        for id in RaceTrackId::all() {
            let t = RaceTrack::new(id, &mut rng);
            assert!(t.min_animals <= t.max_animals, "{:?}", id);
            assert!(t.min_obstacles <= t.max_obstacles, "{:?}", id);
        }
        let uhmurkin = RaceTrack::new(RaceTrackId::Uhmurkin, &mut rng);
        assert_eq!((uhmurkin.min_animals, uhmurkin.max_animals), (10, 12));
        assert_eq!((uhmurkin.min_obstacles, uhmurkin.max_obstacles), (5, 7));
    }

    #[test]
    fn random_track_uses_each_piece_at_most_three_times() {
        let mut rng = StdRng::seed_from_u64(99);
        let t = RaceTrack::new(RaceTrackId::Wijadidja, &mut rng);
        for piece in Piece::ALL {
            assert!(t.pieces.iter().filter(|p| **p == piece).count() <= 3);
        }
    }

    #[test]
    fn background_names_are_one_based() {
        let mut rng = StdRng::seed_from_u64(1);
        let t = RaceTrack::new(RaceTrackId::YankeeShot, &mut rng);
        let names = t.background_names();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "background_grassy_1_1");
        assert_eq!(names[3], "background_grassy_6_2");
    }
}
