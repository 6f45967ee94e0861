//! # Weekly Photo Rotation
//!
//! Picks one background photo per calendar week from a folder of images.
//!
//! ## Selection rules
//! - **Pure**: the choice depends only on the week index and the sorted list
//!   of candidate names; nothing is stored between runs
//! - **No repeats within a cycle**: weeks `k·N .. (k+1)·N` map to a
//!   permutation of the N photos, so every photo appears exactly once
//! - **Shuffled per cycle**: each cycle uses its own Fisher–Yates shuffle
//!
//! ## Cross-installation stability
//! Every "random" draw is the MD5 digest of the key `cycle_{cycle}_{i}`, read
//! as a 128-bit big-endian integer and reduced modulo `i + 1`. Another
//! installation with the same photo names picks the same photo in the same
//! week, whatever language or platform it runs on.

use crate::{CalendarError, WeekIndex};
use chrono::{Datelike, NaiveDate};
use image::DynamicImage;
use log::{debug, info};
use md5::{Digest, Md5};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions accepted as photos (lowercase)
pub const PHOTO_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

/// Day number (counted from 0001-01-01 = 1) of the epoch Monday 1970-01-05
const EPOCH_MONDAY: i64 = 719_167;

/// Week index of a date: whole 7-day periods since Monday 1970-01-05
pub fn week_index(date: NaiveDate) -> WeekIndex {
    (i64::from(date.num_days_from_ce()) - EPOCH_MONDAY).div_euclid(7)
}

/// Deterministic draw in `0..=i` for position `i` of a cycle's shuffle
fn shuffle_draw(cycle: i64, i: usize) -> usize {
    let digest = Md5::digest(format!("cycle_{}_{}", cycle, i).as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    (u128::from_be_bytes(bytes) % (i as u128 + 1)) as usize
}

/// Permutation of `0..n` used for one cycle
pub fn cycle_permutation(cycle: i64, n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = shuffle_draw(cycle, i);
        indices.swap(i, j);
    }
    indices
}

/// Choose the photo for `week` from a sorted candidate list
pub fn select_weekly_photo<S: AsRef<str>>(
    candidates: &[S],
    week: WeekIndex,
) -> Option<&str> {
    let n = candidates.len();
    if n == 0 {
        return None;
    }
    let cycle = week.div_euclid(n as i64);
    let position = week.rem_euclid(n as i64) as usize;
    let permutation = cycle_permutation(cycle, n);
    Some(candidates[permutation[position]].as_ref())
}

/// Sorted photo file names in `dir`
pub fn list_photos<P: AsRef<Path>>(dir: P) -> Result<Vec<String>, CalendarError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| CalendarError::AssetNotFound {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut photos: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_photo(name))
        .collect();
    photos.sort();
    Ok(photos)
}

fn is_photo(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PHOTO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Path of the photo for `week` inside `dir`
pub fn weekly_photo_path<P: AsRef<Path>>(
    dir: P,
    week: WeekIndex,
) -> Result<PathBuf, CalendarError> {
    let dir = dir.as_ref();
    let photos = list_photos(dir)?;
    let name = select_weekly_photo(&photos, week).ok_or_else(|| CalendarError::EmptyAssetSet {
        dir: dir.to_path_buf(),
    })?;
    debug!("Week {} of {} photos selects {}", week, photos.len(), name);
    Ok(dir.join(name))
}

/// Decode the photo for `week` from `dir`
pub fn load_weekly_photo<P: AsRef<Path>>(
    dir: P,
    week: WeekIndex,
) -> Result<DynamicImage, CalendarError> {
    let path = weekly_photo_path(dir, week)?;
    let photo = image::open(&path).map_err(|e| CalendarError::AssetNotFound {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    info!(
        "Loaded weekly photo {} ({}x{})",
        path.display(),
        photo.width(),
        photo.height()
    );
    Ok(photo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("photo_{:02}.jpg", i)).collect()
    }

    #[test]
    fn test_week_index_epoch() {
        let monday = NaiveDate::from_ymd_opt(1970, 1, 5).unwrap();
        assert_eq!(week_index(monday), 0);
        assert_eq!(week_index(NaiveDate::from_ymd_opt(1970, 1, 11).unwrap()), 0);
        assert_eq!(week_index(NaiveDate::from_ymd_opt(1970, 1, 12).unwrap()), 1);
        assert_eq!(week_index(NaiveDate::from_ymd_opt(1970, 1, 4).unwrap()), -1);
    }

    #[test]
    fn test_week_index_is_monday_aligned() {
        // 2025-07-21 is a Monday
        let monday = NaiveDate::from_ymd_opt(2025, 7, 21).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2025, 7, 27).unwrap();
        let next = NaiveDate::from_ymd_opt(2025, 7, 28).unwrap();
        assert_eq!(week_index(monday), week_index(sunday));
        assert_eq!(week_index(monday) + 1, week_index(next));
    }

    #[test]
    fn test_known_permutations() {
        // Reference values computed independently from the md5 key scheme
        assert_eq!(cycle_permutation(0, 5), vec![4, 0, 2, 1, 3]);
        assert_eq!(cycle_permutation(1, 5), vec![3, 4, 2, 1, 0]);
        assert_eq!(cycle_permutation(414, 7), vec![3, 1, 0, 4, 2, 5, 6]);

        let photos = names(7);
        assert_eq!(select_weekly_photo(&photos, 2900), Some("photo_00.jpg"));
        assert_eq!(select_weekly_photo(&photos, 2901), Some("photo_04.jpg"));
        assert_eq!(select_weekly_photo(&photos, 2902), Some("photo_02.jpg"));
    }

    #[test]
    fn test_draws_stay_in_range() {
        for i in 1..20 {
            let j = shuffle_draw(3, i);
            assert!(j <= i);
            assert_eq!(j, shuffle_draw(3, i));
        }
    }

    #[test]
    fn test_empty_candidates() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(select_weekly_photo(&empty, 12), None);
    }

    #[test]
    fn test_single_candidate() {
        let one = names(1);
        for week in -3..10 {
            assert_eq!(select_weekly_photo(&one, week), Some("photo_00.jpg"));
        }
    }

    #[test]
    fn test_cycles_differ() {
        let n = 12;
        let perms: HashSet<Vec<usize>> = (0..6).map(|c| cycle_permutation(c, n)).collect();
        assert!(perms.len() > 1, "every cycle produced the same order");
    }

    proptest! {
        #[test]
        fn selection_is_pure(week in -10_000i64..10_000, n in 2usize..40) {
            let photos = names(n);
            prop_assert_eq!(
                select_weekly_photo(&photos, week),
                select_weekly_photo(&photos, week)
            );
        }

        #[test]
        fn each_cycle_is_a_permutation(cycle in -500i64..500, n in 1usize..40) {
            let photos = names(n);
            let start = cycle * n as i64;
            let chosen: HashSet<&str> = (start..start + n as i64)
                .filter_map(|w| select_weekly_photo(&photos, w))
                .collect();
            prop_assert_eq!(chosen.len(), n);
        }
    }

    #[test]
    fn test_list_photos_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.webp", ".hidden"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let photos = list_photos(dir.path()).unwrap();
        assert_eq!(photos, vec!["a.jpg", "b.PNG", "c.webp"]);
    }

    #[test]
    fn test_missing_directory() {
        let result = list_photos("/nonexistent/photos");
        assert!(matches!(result, Err(CalendarError::AssetNotFound { .. })));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), b"no photos").unwrap();
        let result = weekly_photo_path(dir.path(), 5);
        assert!(matches!(result, Err(CalendarError::EmptyAssetSet { .. })));
    }

    #[test]
    fn test_load_weekly_photo() {
        let dir = tempdir().unwrap();
        for (i, name) in ["one.png", "two.png", "three.png"].iter().enumerate() {
            GrayImage::from_pixel(8 + i as u32, 4, Luma([200]))
                .save(dir.path().join(name))
                .unwrap();
        }

        let photo = load_weekly_photo(dir.path(), 2900).unwrap();
        assert_eq!(photo.height(), 4);

        // Every photo of the cycle is loadable and distinct
        let widths: HashSet<u32> = (2901..2904)
            .map(|w| load_weekly_photo(dir.path(), w).unwrap().width())
            .collect();
        assert_eq!(widths.len(), 3);
    }

    #[test]
    fn test_undecodable_photo() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        let result = load_weekly_photo(dir.path(), 0);
        assert!(matches!(result, Err(CalendarError::AssetNotFound { .. })));
    }
}
