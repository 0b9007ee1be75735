use itertools::Itertools;
use rstest::{fixture, rstest};
use tetmesh::error::{ErrorKind, MshError};
use tetmesh::mesh::{Element, Mesh};
use tetmesh::neighbours::{tetrahedron_neighbours, Tetrahedron, FACES_PER_ELT};
use tetmesh::utils::f;
use tetmesh::{read_msh, read_msh_from};

#[fixture]
fn cube() -> Mesh {
    read_msh("./data/cube.msh").unwrap()
}

/// An `n`x`n`x`n` block of cubes written out as msh 4.1 text
///
/// Node tags are multiplied by `stride` to leave gaps in the numbering. The
/// lower half of the cubes (in z) go in volume 1 ("Water"), the rest in
/// volume 2 ("Steel").
fn structured_msh(n: usize, stride: usize) -> String {
    let tag = |i: usize, j: usize, k: usize| stride * (1 + i + (n + 1) * (j + (n + 1) * k));

    let mut lower = Vec::new();
    let mut upper = Vec::new();
    for ((i, j), k) in (0..n).cartesian_product(0..n).cartesian_product(0..n) {
        for axes in (0..3).permutations(3) {
            let mut corner = [i, j, k];
            let mut nodes = vec![tag(i, j, k)];
            for axis in axes {
                corner[axis] += 1;
                nodes.push(tag(corner[0], corner[1], corner[2]));
            }
            match k < n / 2 {
                true => lower.push(nodes),
                false => upper.push(nodes),
            }
        }
    }

    let n_nodes = (n + 1).pow(3);
    let mut s = "$MeshFormat\n4.1 0 8\n$EndMeshFormat\n".to_string();
    s += "$PhysicalNames\n2\n3 1 \"Water\"\n3 2 \"Steel\"\n$EndPhysicalNames\n";
    s += "$Entities\n0 0 0 2\n";
    s += "1 0 0 0 1 1 1 1 1 0\n2 0 0 0 1 1 1 1 2 0\n$EndEntities\n";

    s += &f!("$Nodes\n1 {n_nodes} {stride} {}\n", stride * n_nodes);
    s += &f!("3 1 0 {n_nodes}\n");
    let grid = || {
        (0..=n)
            .cartesian_product(0..=n)
            .cartesian_product(0..=n)
            .map(|((k, j), i)| (i, j, k))
    };
    for (i, j, k) in grid() {
        s += &f!("{}\n", tag(i, j, k));
    }
    for (i, j, k) in grid() {
        s += &f!("{i} {j} {k}\n");
    }
    s += "$EndNodes\n";

    let total = lower.len() + upper.len();
    s += &f!("$Elements\n2 {total} 1 {total}\n");
    let mut element_tag = 0;
    for (volume, bloc) in [(1, &lower), (2, &upper)] {
        s += &f!("3 {volume} 4 {}\n", bloc.len());
        for nodes in bloc {
            element_tag += 1;
            s += &f!("{element_tag} {}\n", nodes.iter().join(" "));
        }
    }
    s += "$EndElements\n";
    s
}

/// Compare every face against every other face
fn brute_force(elements: &[Tetrahedron]) -> Vec<[Option<usize>; FACES_PER_ELT]> {
    elements
        .iter()
        .enumerate()
        .map(|(i, element)| {
            element.faces().map(|face| {
                (0..elements.len()).find(|&j| j != i && elements[j].face_index(&face).is_some())
            })
        })
        .collect()
}

#[rstest]
fn cube_contents(cube: Mesh) {
    assert_eq!(cube.elements.len(), 6);
    assert_eq!(cube.nodes.len(), 8);
    assert_eq!(cube.media.len(), 1);
    assert_eq!(cube.media[0].tag, 1);
    assert_eq!(cube.media[0].name, "Water");
    assert!(cube.elements.iter().all(|e| e.medium == 1));
    assert_eq!(cube.bounds(), Some([[0.0; 3], [1.0; 3]]));
}

#[rstest]
fn cube_neighbours(cube: Mesh) {
    let table = cube.neighbours().unwrap();
    let expected = [
        [None, Some(2), Some(1), None],
        [None, Some(4), Some(0), None],
        [None, Some(0), Some(3), None],
        [None, Some(5), Some(2), None],
        [None, Some(1), Some(5), None],
        [None, Some(3), Some(4), None],
    ];
    assert_eq!(table.as_slice(), &expected);
    assert_eq!(table.n_boundary_faces(), 12);
}

#[rstest]
fn file_and_memory_readers_agree(cube: Mesh) {
    let text = std::fs::read_to_string("./data/cube.msh").unwrap();
    assert_eq!(read_msh_from(text.as_bytes()).unwrap(), cube);
}

#[rstest]
fn cube_to_json(cube: Mesh) {
    let value = serde_json::to_value(&cube).unwrap();
    assert_eq!(value["elements"].as_array().unwrap().len(), 6);
    assert_eq!(value["media"][0]["name"], "Water");
    assert_eq!(value["elements"][0]["nodes"], serde_json::json!([1, 2, 4, 8]));
}

#[rstest]
#[case(1, 1)]
#[case(2, 1)]
#[case(3, 7)]
#[case(4, 100)]
fn structured_meshes(#[case] n: usize, #[case] stride: usize) {
    let mesh = read_msh_from(structured_msh(n, stride).as_bytes()).unwrap();
    assert_eq!(mesh.elements.len(), 6 * n.pow(3));
    assert_eq!(mesh.nodes.len(), (n + 1).pow(3));
    assert_eq!(mesh.media.len(), 2);

    let per_medium = mesh.elements_per_medium();
    assert_eq!(per_medium[0].1 + per_medium[1].1, mesh.elements.len());

    let table = mesh.neighbours().unwrap();
    let elements: Vec<Tetrahedron> = mesh
        .elements
        .iter()
        .map(|e| Tetrahedron::try_from(e).unwrap())
        .collect();
    assert_eq!(table.as_slice(), brute_force(&elements).as_slice());

    // two triangles on each square of the outer surface
    assert_eq!(table.n_boundary_faces(), 12 * n * n);
}

#[test]
fn sparse_tags_give_the_same_table() {
    let dense = read_msh_from(structured_msh(2, 1).as_bytes()).unwrap();
    let sparse = read_msh_from(structured_msh(2, 1000).as_bytes()).unwrap();
    assert_eq!(dense.neighbours().unwrap(), sparse.neighbours().unwrap());
}

#[test]
fn neighbours_without_a_file() {
    let elements = [
        Tetrahedron::new(1, 2, 3, 4).unwrap(),
        Tetrahedron::new(2, 3, 4, 5).unwrap(),
        Tetrahedron::new(3, 4, 5, 6).unwrap(),
    ];
    let table = tetrahedron_neighbours(&elements).unwrap();
    assert_eq!(table.neighbours_of(0), Some(&[Some(1), None, None, None]));
    assert_eq!(table.neighbours_of(1), Some(&[Some(2), None, None, Some(0)]));
    assert_eq!(table.neighbours_of(2), Some(&[None, None, None, Some(1)]));
}

#[test]
fn non_manifold_mesh() {
    let mut mesh = read_msh("./data/cube.msh").unwrap();
    // a third tetrahedron on the face {1, 2, 8} shared by elements 0 and 1
    mesh.elements.push(Element::new(1, [1, 2, 8, 3]));
    let err = mesh.neighbours().unwrap_err();
    let cause = err.downcast_ref::<MshError>().unwrap();
    assert_eq!(cause.kind(), ErrorKind::InvalidElement);
    assert!(matches!(cause, MshError::NonManifoldFace { .. }));
}

#[rstest]
#[case("./data/missing.msh")]
#[case("./data")]
fn unreadable_paths(#[case] path: &str) {
    assert!(read_msh(path).is_err());
}

#[rstest]
#[case("$MeshFormat\n4.1 1 8\n$EndMeshFormat\n", ErrorKind::UnsupportedContent)]
#[case("$MeshFormat\n2.2 0 8\n$EndMeshFormat\n", ErrorKind::MalformedHeader)]
#[case("$MeshFormat\n4.1 0\n$EndMeshFormat\n", ErrorKind::MalformedHeader)]
#[case("$MeshFormat\n", ErrorKind::MalformedHeader)]
#[case("$MeshFormat\nabc\n$EndMeshFormat\n", ErrorKind::MalformedHeader)]
#[case("$MeshFormat\n4.1 0 8\n$EndMeshFormat\n", ErrorKind::EmptySection)]
#[case("$MeshFormat\n4.1 0 8\n$EndMeshFormat\n$Nodes\n1 1 1 1\n", ErrorKind::SectionStructure)]
fn error_kinds(#[case] input: &str, #[case] kind: ErrorKind) {
    let err = read_msh_from(input.as_bytes()).unwrap_err();
    assert_eq!(err.downcast_ref::<MshError>().unwrap().kind(), kind);
}
