//! Integration tests for the insertion operators: cell counts, returned
//! darts, and attribute discipline across whole edit sequences.

use cmap::prelude::*;

fn census<const D: usize>(map: &CMap<D>) -> Vec<usize> {
    (0..=D).map(|i| map.count_cells(i)).collect()
}

#[test]
fn vertex_in_edge_then_vertex_in_edge_again() {
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(3);
    let first = map.insert_cell_0_in_cell_1(face);
    let second = map.insert_cell_0_in_cell_1(first);
    assert_eq!(map.number_of_darts(), 5);
    assert_eq!(census(&map), vec![5, 5, 1]);
    assert!(map.contains_dart(second));
    assert!(map.is_valid().is_ok());
}

#[test]
fn vertex_insertion_in_a_sewn_edge_updates_both_sides() {
    let mut map: CMap<3> = CMap::new();
    let t1 = map.make_combinatorial_tetrahedron();
    let t2 = map.make_combinatorial_tetrahedron();
    map.sew(3, t1, t2);
    // The sewn edge has four darts: two per face side, two per volume.
    assert_eq!(map.cell_orbit(t1, 1).len(), 4);
    let new_dart = map.insert_cell_0_in_cell_1(t1);
    assert!(map.contains_dart(new_dart));
    assert_eq!(map.number_of_darts(), 28);
    assert_eq!(map.cell_orbit(new_dart, 1).len(), 4);
    assert!(map.is_valid().is_ok());
}

#[test]
fn triangulation_after_edge_split_keeps_the_fan_even() {
    // Split one edge of a square, then triangulate: five sectors.
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(4);
    map.insert_cell_0_in_cell_1(face);
    let center = map.insert_cell_0_in_cell_2(face);
    assert_eq!(map.count_cells(2), 5);
    assert_eq!(map.cell_orbit(center, 0).len(), 5);
    assert!(map.is_valid().is_ok());
}

#[test]
fn edge_insertion_chain_partitions_a_hexagon() {
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(6);
    let third = map.beta(map.beta(map.beta(face, 1), 1), 1);
    let first_cut = map.insert_cell_1_in_cell_2(face, third);
    assert_eq!(map.count_cells(2), 2);
    // Cut one of the halves again.
    let quarter = map.beta(map.beta(first_cut, 1), 1);
    assert!(map.is_insertable_cell_1_in_cell_2(first_cut, quarter));
    map.insert_cell_1_in_cell_2(first_cut, quarter);
    assert_eq!(map.count_cells(2), 3);
    assert_eq!(map.count_cells(1), 8);
    assert!(map.is_valid().is_ok());
}

#[test]
fn dangling_edge_extends_the_facet_walk() {
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(4);
    let pendant = map.insert_dangling_cell_1_in_cell_2(face);
    assert_eq!(map.beta(pendant, 2), map.beta(pendant, 0));
    assert_eq!(map.count_cells(2), 1);
    // The facet walk now passes through the dangling edge both ways.
    assert_eq!(map.beta1_orbit(face).len(), 6);
    assert!(map.is_valid().is_ok());
}

#[test]
fn facet_insertion_splits_only_the_pierced_volume() {
    let mut map: CMap<3> = CMap::new();
    let t1 = map.make_combinatorial_tetrahedron();
    let t2 = map.make_combinatorial_tetrahedron();
    map.sew(3, t1, t2);
    assert_eq!(map.count_cells(3), 2);
    // A facet path inside t1, away from the sewn wall: pick the facet the
    // sewn one is glued to through β2.
    let dart = map.beta(t1, 2);
    let path = [dart, map.beta(dart, 1), map.beta(map.beta(dart, 1), 1)];
    assert!(map.is_insertable_cell_2_in_cell_3(&path));
    map.insert_cell_2_in_cell_3(&path);
    assert_eq!(map.count_cells(3), 3);
    assert!(map.is_valid().is_ok());
}

#[test]
fn attributes_follow_a_whole_edit_sequence() {
    let mut map: CMap<2, u32> = CMap::new();
    let face = map.make_combinatorial_polygon(4);
    let face_key = map.set_attribute(face, 2, 40).unwrap();
    map.set_attribute(face, 0, 7).unwrap();

    // Split the facet: one side keeps the record, the other is a copy.
    let across = map.beta(map.beta(face, 1), 1);
    let cut = map.insert_cell_1_in_cell_2(face, across);
    assert!(map.is_valid().is_ok());
    let near = map.attribute_of(cut, 2);
    let far = map.attribute_of(map.beta(cut, 2), 2);
    assert_ne!(near, far);
    assert_eq!(*map.attribute(2, near).unwrap().data(), 40);
    assert_eq!(*map.attribute(2, far).unwrap().data(), 40);

    // Remove the cut again: the two records merge back into one.
    assert_eq!(map.remove_cell(cut, 1), 2);
    assert!(map.is_valid().is_ok());
    let merged = map.attribute_of(face, 2);
    assert_eq!(*map.attribute(2, merged).unwrap().data(), 40);
    assert_eq!(map.attribute(2, merged).unwrap().ref_count(), 4);
    let _ = face_key;
}
