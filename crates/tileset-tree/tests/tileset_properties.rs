use tileset_tree::frame::resolve;
use tileset_tree::tileset::{serialize, TileNode, TilesetDocument, TilesetOptions};
use tileset_tree::tree::{build_explicit, build_implicit, ExplicitParams, Tile, TileArena};
use tileset_tree::{
    CoordinateFrame, Extent, FrameOptions, FrameReference, GeometricErrorModel, SubdivisionScheme,
    TileAddress, TilingError,
};

const EXTENT: [f64; 6] = [
    841974.335,
    6517985.934,
    843026.163,
    6519046.056,
    155.337,
    208.582,
];

const TRANSLATION: [f64; 3] = [842500.249, 6518515.995, 0.0];

#[rustfmt::skip]
const ECEF_COLUMNS: [f64; 16] = [
    -0.0862, 0.9963, 0.0, 0.0,
    -0.7856, -0.0680, 0.6150, 0.0,
    0.6127, 0.0530, 0.7886, 0.0,
    3_924_000.12, 339_551.7, 5_002_803.3, 1.0,
];

fn frame(keep_projection: bool, use_ecef_transform: bool) -> CoordinateFrame {
    let options = FrameOptions {
        keep_projection,
        use_ecef_transform,
        crs: Some("EPSG:28992".into()),
    };
    let reference = if use_ecef_transform {
        FrameReference::transform(ECEF_COLUMNS, TRANSLATION)
    } else {
        FrameReference::translation(TRANSLATION)
    };
    resolve(&reference, &options).unwrap()
}

fn make_extent() -> Extent {
    Extent::from_array(EXTENT).unwrap()
}

fn build(frame: &CoordinateFrame, arena: &TileArena, root_error: f64) -> TilesetDocument {
    let params = ExplicitParams {
        frame,
        extent: make_extent(),
        model: GeometricErrorModel::with_root_error(root_error).unwrap(),
        scheme: SubdivisionScheme::Quadtree,
        options: TilesetOptions::default(),
    };
    build_explicit(arena, &params).unwrap()
}

fn single_tile_arena() -> TileArena {
    let mut arena = TileArena::new();
    arena.push_root(Tile::new(TileAddress::ROOT, make_extent()));
    arena
}

fn to_json(doc: &TilesetDocument) -> serde_json::Value {
    serde_json::from_str(&serialize(doc).unwrap()).unwrap()
}

#[test]
fn keep_projection_writes_box_and_crs() {
    let doc = build(&frame(true, false), &single_tile_arena(), 500.0);
    let json = to_json(&doc);

    let volume = &json["root"]["boundingVolume"];
    assert_eq!(volume["box"].as_array().unwrap().len(), 12);
    assert!(volume.get("region").is_none());
    assert_eq!(json["asset"]["crs"], "EPSG:28992");

    let transform = json["root"]["transform"].as_array().unwrap();
    assert_eq!(transform.len(), 16);
    assert_eq!(transform[12], TRANSLATION[0]);
    assert_eq!(transform[0], 1.0);
}

#[test]
fn geographic_mode_writes_region_without_crs() {
    let doc = build(&frame(false, false), &single_tile_arena(), 500.0);
    let json = to_json(&doc);

    let volume = &json["root"]["boundingVolume"];
    assert_eq!(volume["region"].as_array().unwrap().len(), 6);
    assert!(volume.get("box").is_none());
    assert!(json["asset"].get("crs").is_none());
    assert!(json["root"]["children"][0]["boundingVolume"].get("region").is_some());
}

#[test]
fn ecef_mode_keeps_caller_matrix() {
    let doc = build(&frame(true, true), &single_tile_arena(), 500.0);
    assert_eq!(doc.root.transform, Some(ECEF_COLUMNS));
    assert!(doc.root.bounding_volume.as_box().is_some());

    let json = to_json(&doc);
    let transform: Vec<f64> = json["root"]["transform"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert_eq!(transform, ECEF_COLUMNS);
}

#[test]
fn ecef_mode_requires_transform() {
    let options = FrameOptions {
        use_ecef_transform: true,
        ..FrameOptions::default()
    };
    assert!(matches!(
        resolve(&FrameReference::translation(TRANSLATION), &options),
        Err(TilingError::MissingEcefTransform)
    ));
}

#[test]
fn box_matches_reference_values() {
    let doc = build(&frame(true, false), &single_tile_arena(), 500.0);
    let b = doc.root.children[0].bounding_volume.as_box().unwrap().to_array();

    assert_eq!(b[2], 155.337 + 0.5 * (208.582 - 155.337));
    assert_eq!(b[3], 0.5 * (843026.163 - 841974.335));
    assert!((b[0] - (0.5 * (841974.335 + 843026.163) - TRANSLATION[0])).abs() < 1e-6);
    for i in [4, 5, 6, 8, 9, 10] {
        assert_eq!(b[i], 0.0);
    }
}

#[test]
fn error_ladder_for_root_error_500() {
    let mut arena = TileArena::new();
    let tile = arena.push_root(Tile::new(TileAddress::ROOT, make_extent()));
    arena
        .push_child(tile, Tile::new(TileAddress::ROOT, make_extent()).with_lod(1))
        .unwrap();

    let doc = build(&frame(true, false), &arena, 500.0);
    assert_eq!(doc.geometric_error, 500.0);
    assert_eq!(doc.root.geometric_error, 250.0);
    assert_eq!(doc.root.children[0].geometric_error, 125.0);
    assert_eq!(doc.root.children[0].children[0].geometric_error, 15.625);
}

#[test]
fn sibling_roots_become_two_children() {
    let tiles = vec![
        Tile::new(TileAddress::new(0, 0, 0), make_extent()),
        Tile::new(TileAddress::new(1, 1, 1), make_extent()),
    ];
    let arena = TileArena::from_roots(tiles.clone()).unwrap();

    for kind in [frame(true, false), frame(false, false)] {
        let doc = build(&kind, &arena, 500.0);
        assert_eq!(doc.root.children.len(), 2);
        for child in &doc.root.children {
            assert_eq!(child.bounding_volume.kind(), kind.volume_kind());
            assert!(child.content.is_some());
            assert_eq!(child.geometric_error, 125.0);
        }
    }

    // inferring the hierarchy from addresses nests (1,1,1) below the root cell
    let inferred = TileArena::arrange(tiles).unwrap();
    assert_eq!(build(&frame(true, false), &inferred, 500.0).root.children.len(), 1);
}

#[test]
fn implicit_error_ladder() {
    let model = GeometricErrorModel::with_root_error(500.0).unwrap();
    let tree = build_implicit(
        &make_extent(),
        &model,
        SubdivisionScheme::Quadtree,
        2,
        &frame(true, false),
    )
    .unwrap();
    let doc = tree.document(&TilesetOptions::default()).unwrap();

    fn check(node: &TileNode, depth: i32) -> usize {
        assert_eq!(node.geometric_error, 500.0 / 2f64.powi(depth + 1));
        1 + node.children.iter().map(|c| check(c, depth + 1)).sum::<usize>()
    }
    assert_eq!(check(&doc.root, 0), 1 + 4 + 16);
    assert_eq!(doc.root.max_depth(), 3);

    for address in tree.tiles() {
        assert_eq!(
            tree.geometric_error(&address).unwrap(),
            500.0 / 2f64.powi(address.level as i32 + 1)
        );
    }
}

#[test]
fn implicit_depth_zero_is_root_only() {
    let model = GeometricErrorModel::with_root_error(500.0).unwrap();
    for scheme in [SubdivisionScheme::Quadtree, SubdivisionScheme::Octree] {
        let tree = build_implicit(&make_extent(), &model, scheme, 0, &frame(false, false)).unwrap();
        let doc = tree.document(&TilesetOptions::default()).unwrap();
        assert!(doc.root.children.is_empty());
        assert!(doc.root.bounding_volume.as_region().is_some());
        assert_eq!(tree.tiles().count(), 1);
    }
}

#[test]
fn inverted_extent_fails_fast() {
    assert!(matches!(
        Extent::from_array([1.0, 0.0, 0.0, 1.0, 0.0, 1.0]),
        Err(TilingError::InvalidExtent { axis: 'x', .. })
    ));
}

#[test]
fn serialized_document_reads_back() {
    let doc = build(&frame(true, false), &single_tile_arena(), 500.0);
    let parsed = TilesetDocument::from_json(&serialize(&doc).unwrap()).unwrap();
    assert_eq!(parsed, doc);
}
