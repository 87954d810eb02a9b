//! Grouping of fragmented character contours.
//!
//! A character can break into several blobs after thresholding (accents,
//! split strokes). Narrow contours whose centroid sits almost straight above
//! or below an existing group's centroid are folded into that group.

use crate::contours::{self, Contour};
use crate::geometry::{min_area_rect, PixelRect};

/// What to do with contours at least as wide as a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WideContourPolicy {
    /// Keep each as a singleton group that nothing merges into.
    #[default]
    PassThrough,
    /// Exclude them from the output.
    Drop,
}

/// Configuration for fragment merging.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Maximum horizontal centroid distance for a merge (pixels, exclusive).
    pub max_dx: f64,
    /// Maximum vertical centroid distance for a merge (pixels, exclusive).
    pub max_dy: f64,
    /// Contours with a corrected width below this are merge candidates.
    pub min_char_width: f32,
    pub wide_contours: WideContourPolicy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_dx: 2.5,
            max_dy: 15.0,
            min_char_width: 27.0,
            wide_contours: WideContourPolicy::default(),
        }
    }
}

/// Points of one or more contours believed to form a single character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContourGroup {
    pub points: Vec<[i32; 2]>,
    /// False for passed-through wide contours.
    mergeable: bool,
}

impl ContourGroup {
    fn new(points: Vec<[i32; 2]>, mergeable: bool) -> Self {
        Self { points, mergeable }
    }

    /// Pixel-inclusive bounding rectangle of all member points.
    pub fn bounding_rect(&self) -> Option<PixelRect> {
        PixelRect::enclosing(&self.points)
    }

    pub fn is_mergeable(&self) -> bool {
        self.mergeable
    }
}

/// Horizontal extent of a contour's minimum-area rectangle.
///
/// Fitted boxes with a negative angle report the horizontal extent as their
/// height, so the two are swapped back.
pub fn corrected_width(contour: &[[i32; 2]]) -> f32 {
    let rect = min_area_rect(&contours::to_f32(contour));
    if rect.angle_deg < 0.0 {
        rect.height()
    } else {
        rect.width()
    }
}

fn centroids_close(a: [i32; 2], b: [i32; 2], config: &MergeConfig) -> bool {
    let dx = (a[0] - b[0]).abs() as f64;
    let dy = (a[1] - b[1]).abs() as f64;
    dx < config.max_dx && dy < config.max_dy
}

/// Group contours in discovery order.
///
/// A narrow contour joins the first mergeable group whose current centroid
/// is close enough, otherwise it opens a new group. Wide contours follow
/// [`MergeConfig::wide_contours`].
pub fn merge_fragments(contours: &[Contour], config: &MergeConfig) -> Vec<ContourGroup> {
    let mut groups: Vec<ContourGroup> = Vec::new();
    for contour in contours {
        let Some(c) = contours::centroid(contour) else {
            continue;
        };

        if corrected_width(contour) >= config.min_char_width {
            match config.wide_contours {
                WideContourPolicy::PassThrough => {
                    groups.push(ContourGroup::new(contour.clone(), false));
                }
                WideContourPolicy::Drop => {
                    tracing::trace!("segment: dropping wide contour at {:?}", c);
                }
            }
            continue;
        }

        let target = groups.iter_mut().find(|g| {
            g.mergeable
                && contours::centroid(&g.points).is_some_and(|gc| centroids_close(c, gc, config))
        });
        match target {
            Some(group) => group.points.extend_from_slice(contour),
            None => groups.push(ContourGroup::new(contour.clone(), true)),
        }
    }
    settle_groups(&mut groups, config);
    groups
}

/// Fold mergeable groups into earlier close ones until no pair is close.
///
/// Centroids move as fragments join, so a group opened early can end up
/// next to a later one. A group that grows to character width stops being
/// mergeable. The result is a fixed point: regrouping its own output
/// changes nothing.
fn settle_groups(groups: &mut Vec<ContourGroup>, config: &MergeConfig) {
    'restart: loop {
        for i in 0..groups.len() {
            if !groups[i].mergeable {
                continue;
            }
            let Some(ci) = contours::centroid(&groups[i].points) else {
                continue;
            };
            for j in i + 1..groups.len() {
                let close = groups[j].mergeable
                    && contours::centroid(&groups[j].points)
                        .is_some_and(|cj| centroids_close(ci, cj, config));
                if close {
                    let absorbed = groups.remove(j);
                    let group = &mut groups[i];
                    group.points.extend(absorbed.points);
                    group.mergeable = corrected_width(&group.points) < config.min_char_width;
                    continue 'restart;
                }
            }
        }
        break;
    }
}
