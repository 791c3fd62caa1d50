//! Integration tests for removal and contraction: deletion counts,
//! Euler-style cell counts, boundary cases, and reversibility against the
//! insertion operators.

use cmap::prelude::*;

fn census<const D: usize>(map: &CMap<D>) -> Vec<usize> {
    (0..=D).map(|i| map.count_cells(i)).collect()
}

// =============================================================================
// REVERSIBILITY
// =============================================================================

#[test]
fn insert_vertex_then_contract_edge_restores_the_map() {
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(5);
    let before = census(&map);
    let darts_before = map.number_of_darts();

    let new_dart = map.insert_cell_0_in_cell_1(face);
    assert_eq!(map.number_of_darts(), darts_before + 1);
    assert!(map.is_contractible(new_dart, 1));
    assert_eq!(map.contract_cell(new_dart, 1), 1);

    assert_eq!(map.number_of_darts(), darts_before);
    assert_eq!(census(&map), before);
    assert!(map.is_valid().is_ok());
}

#[test]
fn insert_edge_then_remove_edge_restores_the_map() {
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(6);
    let before = census(&map);

    let across = map.beta(map.beta(map.beta(face, 1), 1), 1);
    let cut = map.insert_cell_1_in_cell_2(face, across);
    assert_eq!(map.count_cells(2), 2);

    assert!(map.is_removable(cut, 1));
    assert_eq!(map.remove_cell(cut, 1), 2);
    assert_eq!(census(&map), before);
    assert!(map.is_valid().is_ok());
}

#[test]
fn insert_facet_then_remove_facet_restores_the_tetrahedron() {
    let mut map: CMap<3> = CMap::new();
    let dart = map.make_combinatorial_tetrahedron();
    let before = census(&map);

    let path = [dart, map.beta(dart, 1), map.beta(map.beta(dart, 1), 1)];
    let facet = map.insert_cell_2_in_cell_3(&path);
    assert_eq!(map.count_cells(3), 2);
    assert_eq!(map.number_of_darts(), 18);

    assert!(map.is_removable(facet, 2));
    assert_eq!(map.remove_cell(facet, 2), 6);
    assert_eq!(map.number_of_darts(), 12);
    assert_eq!(census(&map), before);
    assert!(map.is_valid().is_ok());
}

// =============================================================================
// DELETION COUNTS AND CELL COUNTS
// =============================================================================

#[test]
fn removal_returns_the_orbit_size_on_every_dimension() {
    let mut map: CMap<3> = CMap::new();
    let t1 = map.make_combinatorial_tetrahedron();
    let t2 = map.make_combinatorial_tetrahedron();
    map.sew(3, t1, t2);

    let volume_orbit = map.cell_orbit(t2, 3).len();
    assert_eq!(map.remove_cell(t2, 3), volume_orbit);

    let edge_orbit = map.cell_orbit(t1, 1).len();
    assert_eq!(map.remove_cell(t1, 1), edge_orbit);
    assert!(map.is_valid().is_ok());
}

#[test]
fn removing_an_interior_edge_merges_exactly_two_faces() {
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(6);
    let across = map.beta(map.beta(map.beta(face, 1), 1), 1);
    let cut = map.insert_cell_1_in_cell_2(face, across);
    let faces = map.count_cells(2);
    map.remove_cell(cut, 1);
    assert_eq!(map.count_cells(2), faces - 1);
    assert!(map.is_valid().is_ok());
}

#[test]
fn removing_a_dangling_edge_keeps_one_face() {
    // Boundary case: the dangling edge has the same face on both sides, so
    // removal must not decrement the face count.
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(4);
    let pendant = map.insert_dangling_cell_1_in_cell_2(face);
    assert_eq!(map.count_cells(2), 1);
    assert!(map.is_removable(pendant, 1));
    assert_eq!(map.remove_cell(pendant, 1), 2);
    assert_eq!(map.count_cells(2), 1);
    assert_eq!(map.number_of_darts(), 4);
    assert!(map.is_valid().is_ok());
}

// =============================================================================
// VERTEX REMOVAL BOUNDARY CASES
// =============================================================================

#[test]
fn removing_a_vertex_between_two_free_edges_collapses_them() {
    // Boundary case 2: a vertex shared by two otherwise free edges.
    let mut map: CMap<2> = CMap::new();
    let a = map.create_dart();
    let b = map.create_dart();
    map.basic_link_beta(a, b, 1);
    let vertex_orbit = map.cell_orbit(b, 0).len();
    assert_eq!(map.count_cells(1), 2);
    let deleted = map.remove_cell(b, 0);
    assert_eq!(deleted, vertex_orbit);
    assert_eq!(map.count_cells(1), 1);
    assert_eq!(map.number_of_darts(), 1);
    assert!(map.is_valid().is_ok());
}

#[test]
fn vertex_of_high_degree_is_not_removable() {
    // The center of a triangulated square touches four edges; removal only
    // handles vertices with at most two incident edges.
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(4);
    let center = map.insert_cell_0_in_cell_2(face);
    assert!(!map.is_removable(center, 0));
}

#[test]
fn insert_vertex_then_remove_vertex_restores_the_map() {
    // remove_cell on dimension 0 undoes an edge split just like edge
    // contraction does.
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(4);
    let before = census(&map);
    let mid = map.insert_cell_0_in_cell_1(face);
    assert!(map.is_removable(mid, 0));
    assert_eq!(map.remove_cell(mid, 0), 1);
    assert_eq!(census(&map), before);
    assert!(map.is_valid().is_ok());
}

// =============================================================================
// CONTRACTION BOUNDARY CASES
// =============================================================================

#[test]
fn contracting_every_edge_of_a_polygon_empties_it() {
    let mut map: CMap<2> = CMap::new();
    let mut dart = map.make_combinatorial_polygon(4);
    for _ in 0..3 {
        let next = map.beta(dart, 1);
        assert_eq!(map.contract_cell(dart, 1), 1);
        dart = next;
    }
    // The last edge is a self-loop by now.
    assert_eq!(map.beta(dart, 0), dart);
    assert_eq!(map.contract_cell(dart, 1), 1);
    assert_eq!(map.number_of_darts(), 0);
    assert!(map.is_valid().is_ok());
}

#[test]
fn contract_merges_exactly_two_vertices() {
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(5);
    let vertices = map.count_cells(0);
    let edges = map.count_cells(1);
    map.contract_cell(face, 1);
    assert_eq!(map.count_cells(0), vertices - 1);
    assert_eq!(map.count_cells(1), edges - 1);
    assert!(map.is_valid().is_ok());
}

// =============================================================================
// MARK HYGIENE
// =============================================================================

#[test]
fn operators_leave_the_mark_pool_clean() {
    let mut map: CMap<2> = CMap::new();
    let face = map.make_combinatorial_polygon(6);
    let across = map.beta(map.beta(map.beta(face, 1), 1), 1);
    let cut = map.insert_cell_1_in_cell_2(face, across);
    map.remove_cell(cut, 1);
    map.insert_cell_0_in_cell_1(face);
    // Every mark must be back in the pool: acquiring all of them succeeds.
    let marks: Vec<_> = (0..NB_MARKS).map(|_| map.get_new_mark().unwrap()).collect();
    for mark in marks {
        assert!(map.is_whole_map_unmarked(mark));
        map.free_mark(mark).unwrap();
    }
    assert!(map.is_valid().is_ok());
}
