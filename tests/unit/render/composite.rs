use super::*;

#[test]
fn over_opaque_src_replaces_dst() {
    assert_eq!(over([1, 2, 3, 255], [9, 8, 7, 255], 1.0), [9, 8, 7, 255]);
}

#[test]
fn over_transparent_src_keeps_dst() {
    assert_eq!(over([1, 2, 3, 255], [0, 0, 0, 0], 1.0), [1, 2, 3, 255]);
    assert_eq!(over([1, 2, 3, 255], [9, 9, 9, 255], 0.0), [1, 2, 3, 255]);
}

#[test]
fn over_half_alpha_blends() {
    let out = over([0, 0, 0, 255], [128, 0, 0, 128], 1.0);
    assert_eq!(out[3], 255);
    assert_eq!(out[0], 128);
}

#[test]
fn over_in_place_rejects_mismatched_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
}

#[test]
fn sprite_is_clipped_at_edges() {
    let (w, h) = (4u32, 4u32);
    let mut dst = vec![0u8; (w * h * 4) as usize];
    let sprite = Sprite {
        width: 2,
        height: 2,
        data: [255u8, 255, 255, 255].repeat(4),
    };

    over_sprite_at(&mut dst, w, h, &sprite, 3, -1).unwrap();
    let covered: Vec<usize> = dst
        .chunks_exact(4)
        .enumerate()
        .filter(|(_, px)| px[3] == 255)
        .map(|(i, _)| i)
        .collect();
    // Only pixel (3, 0) is inside the destination.
    assert_eq!(covered, vec![3]);

    over_sprite_at(&mut dst, w, h, &sprite, 10, 10).unwrap();
    assert_eq!(dst.chunks_exact(4).filter(|px| px[3] == 255).count(), 1);
}
