//! Facet insertion in a 4-map: when the pierced volume is glued to a mirror
//! volume by β4, the new facet must be replicated there with β₂∘β₄ = β₄∘β₂
//! holding on every new dart.

use cmap::prelude::*;

fn glued_volumes() -> (CMap<4>, DartKey) {
    let mut map: CMap<4> = CMap::new();
    let t1 = map.make_combinatorial_tetrahedron();
    let t2 = map.make_combinatorial_tetrahedron();
    assert!(map.is_sewable(4, t1, t2));
    map.sew(4, t1, t2);
    assert!(map.is_valid().is_ok());
    (map, t1)
}

#[test]
fn sewing_two_volumes_at_dimension_four() {
    let (map, t1) = glued_volumes();
    assert_eq!(map.number_of_darts(), 24);
    // Two 4-cells sharing one volume.
    assert_eq!(map.count_cells(4), 2);
    assert_eq!(map.count_cells(3), 1);
    assert!(!map.is_free(t1, 4));
}

#[test]
fn facet_insertion_replicates_across_beta4() {
    let (mut map, t1) = glued_volumes();
    let path = [t1, map.beta(t1, 1), map.beta(map.beta(t1, 1), 1)];
    assert!(map.is_insertable_cell_2_in_cell_3(&path));

    let new_dart = map.insert_cell_2_in_cell_3(&path);
    assert!(map.is_valid().is_ok());

    // Primary ring + β3 mirror on each β4 side: 12 new darts.
    assert_eq!(map.number_of_darts(), 36);

    // The shared volume split on both β4 sides.
    assert_eq!(map.count_cells(3), 2);
    assert_eq!(map.count_cells(4), 2);

    // The replicated facet is β4-linked to the primary one.
    assert!(!map.is_free(new_dart, 4));

    // β2∘β4 == β4∘β2 must hold on every dart of the new facet, on both
    // sides of the mirror.
    for ring_dart in map.cell_orbit(new_dart, 2) {
        let via_2 = map.beta(ring_dart, 2);
        let via_4 = map.beta(ring_dart, 4);
        if via_2.is_null() || via_4.is_null() {
            continue;
        }
        assert_eq!(
            map.beta(via_2, 4),
            map.beta(via_4, 2),
            "β2β4 != β4β2 at a new facet dart"
        );
    }
}

#[test]
fn replicated_facet_removal_restores_the_glued_volumes() {
    let (mut map, t1) = glued_volumes();
    let before: Vec<usize> = (0..=4).map(|i| map.count_cells(i)).collect();
    let path = [t1, map.beta(t1, 1), map.beta(map.beta(t1, 1), 1)];
    let facet = map.insert_cell_2_in_cell_3(&path);

    assert!(map.is_removable(facet, 2));
    // The whole facet, primary, mirror, and both β4 copies, goes at once.
    assert_eq!(map.remove_cell(facet, 2), 12);
    assert_eq!(map.number_of_darts(), 24);
    let after: Vec<usize> = (0..=4).map(|i| map.count_cells(i)).collect();
    assert_eq!(after, before);
    assert!(map.is_valid().is_ok());
}
