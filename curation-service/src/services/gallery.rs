//! Virtual gallery arrangement.
//!
//! Artworks are hung in `position` order across a square room. Each wall takes
//! a contiguous run of `ceil(n / walls)` works, spaced evenly around the
//! wall's centre at eye level.

use crate::models::Artwork;
use serde::Serialize;

pub const DEFAULT_WALLS: usize = 4;
pub const SPACING_METERS: f64 = 2.5;
pub const HANGING_HEIGHT_METERS: f64 = 1.6;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Placement {
    pub artwork_id: String,
    pub title: String,
    pub image_url: String,
    pub wall: usize,
    pub slot: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Wall {
    pub index: usize,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GalleryLayout {
    pub walls: Vec<Wall>,
    pub spacing: f64,
}

impl GalleryLayout {
    pub fn arrange(artworks: &[Artwork], walls: usize) -> Self {
        let walls = walls.max(1);
        let mut ordered: Vec<&Artwork> = artworks.iter().collect();
        ordered.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.created_at.cmp(&b.created_at)));

        let per_wall = ordered.len().div_ceil(walls).max(1);
        let mut layout: Vec<Wall> = (0..walls)
            .map(|index| Wall {
                index,
                placements: Vec::new(),
            })
            .collect();

        for (wall_index, run) in ordered.chunks(per_wall).enumerate() {
            let offset = (run.len() as f64 - 1.0) / 2.0;
            layout[wall_index].placements = run
                .iter()
                .enumerate()
                .map(|(slot, artwork)| Placement {
                    artwork_id: artwork.id.clone(),
                    title: artwork.title.clone(),
                    image_url: artwork.image_url.clone(),
                    wall: wall_index,
                    slot,
                    x: (slot as f64 - offset) * SPACING_METERS,
                    y: HANGING_HEIGHT_METERS,
                })
                .collect();
        }

        Self {
            walls: layout,
            spacing: SPACING_METERS,
        }
    }

    pub fn placement_count(&self) -> usize {
        self.walls.iter().map(|w| w.placements.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artworks(n: usize) -> Vec<Artwork> {
        (0..n)
            .map(|i| {
                Artwork::new(
                    "ex".to_string(),
                    "owner".to_string(),
                    format!("Work {}", i),
                    format!("http://img/{}", i),
                    None,
                    i as i32,
                )
            })
            .collect()
    }

    #[test]
    fn empty_input_gives_empty_walls() {
        let layout = GalleryLayout::arrange(&[], DEFAULT_WALLS);
        assert_eq!(layout.walls.len(), 4);
        assert_eq!(layout.placement_count(), 0);
    }

    #[test]
    fn runs_are_contiguous_per_wall() {
        let layout = GalleryLayout::arrange(&artworks(6), 4);
        let counts: Vec<_> = layout.walls.iter().map(|w| w.placements.len()).collect();
        assert_eq!(counts, vec![2, 2, 2, 0]);
        assert_eq!(layout.walls[1].placements[0].title, "Work 2");
        assert_eq!(layout.walls[1].placements[1].title, "Work 3");
    }

    #[test]
    fn placements_are_centred() {
        let layout = GalleryLayout::arrange(&artworks(3), 1);
        let xs: Vec<_> = layout.walls[0].placements.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-2.5, 0.0, 2.5]);
        assert!(layout.walls[0]
            .placements
            .iter()
            .all(|p| p.y == HANGING_HEIGHT_METERS));
    }

    #[test]
    fn ordered_by_position() {
        let mut works = artworks(2);
        works[0].position = 5;
        let layout = GalleryLayout::arrange(&works, 1);
        assert_eq!(layout.walls[0].placements[0].title, "Work 1");
    }
}
