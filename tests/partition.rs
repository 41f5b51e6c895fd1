use std::fs;
use std::path::Path;

use blast2cmap::partition::partition_joined;
use blast2cmap::workspace::Workspace;

const HEADER: &str = "centroid,latitude,longitude,depth,relative_abundance,temperature,\
salinity,cruise_name,size_frac_lower,size_frac_upper,pident,qseqid";

fn joined_line(centroid: &str, cruise: &str, lower: f64, upper: f64, qseqid: &str) -> String {
    format!("{centroid},31.5,-64.1,5,0.01,23.4,36.6,{cruise},{lower},{upper},98.5,{qseqid}\n")
}

fn setup(temp: &Path, body: &str) -> (Workspace, std::path::PathBuf) {
    let workspace = Workspace::new(&temp.join("out")).unwrap();
    workspace.ensure_data_dir().unwrap();
    let joined = workspace.joined_path().into_std_path_buf();
    fs::write(&joined, format!("{HEADER}\n{body}")).unwrap();
    (workspace, joined)
}

#[test]
fn one_file_per_distinct_group_key() {
    let temp = tempfile::tempdir().unwrap();
    let body = joined_line("c1", "TN397", 0.2, 3.0, "q1")
        + &joined_line("c1", "TN397", 0.2, 3.0, "q1")
        + &joined_line("c1", "KOK1606", 0.2, 3.0, "q1")
        + &joined_line("c2", "TN397", 0.8, 1.2, "q1");
    let (workspace, joined) = setup(temp.path(), &body);

    let partitions = partition_joined(&joined, &workspace).unwrap();
    assert_eq!(partitions.len(), 3);

    for partition in &partitions {
        assert!(partition.path.as_std_path().is_file());
        let content = fs::read_to_string(partition.path.as_std_path()).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.ends_with(",size"));
        for line in lines {
            assert!(line.starts_with(&format!("{},", partition.key.centroid)));
            assert!(line.contains(&format!(",{},", partition.key.cruise_name)));
            assert!(line.ends_with(&format!(",{}", partition.key.size_label)));
        }
    }

    // Two rows shared a key, so one file holds both.
    let first = fs::read_to_string(partitions[0].path.as_std_path()).unwrap();
    assert_eq!(first.lines().count(), 3);
}

#[test]
fn filenames_encode_the_key() {
    let temp = tempfile::tempdir().unwrap();
    let (workspace, joined) = setup(temp.path(), &joined_line("c9", "TN397", 0.2, 3.0, "q7"));

    let partitions = partition_joined(&joined, &workspace).unwrap();
    assert_eq!(partitions.len(), 1);
    assert_eq!(
        partitions[0].path.file_name().unwrap(),
        "asv_c9__cruise_TN397__qseqid_q7__pident_98.50__frac_0.2-3.csv"
    );
}

#[test]
fn size_label_separates_fractions_with_equal_centroid_and_cruise() {
    let temp = tempfile::tempdir().unwrap();
    let body = joined_line("c1", "TN397", 0.2, 3.0, "q1")
        + &joined_line("c1", "TN397", 0.8, 0.8, "q1");
    let (workspace, joined) = setup(temp.path(), &body);

    let partitions = partition_joined(&joined, &workspace).unwrap();
    assert_eq!(partitions.len(), 2);
    assert_eq!(partitions[0].key.size_label, "0.2-3");
    assert_eq!(partitions[1].key.size_label, "0.8-0.8");
}

#[test]
fn float_columns_render_as_in_the_joined_csv() {
    let temp = tempfile::tempdir().unwrap();
    let (workspace, joined) = setup(temp.path(), "c1,31.5,-64.1,5,0.01,23.4,36.6,TN397,0.2,3.0,98.5,q1\n");

    let partitions = partition_joined(&joined, &workspace).unwrap();
    assert_eq!(partitions.len(), 1);
    let content = fs::read_to_string(partitions[0].path.as_std_path()).unwrap();
    let row = content.lines().nth(1).unwrap();
    // serde writes floats the same way join_hits does: 3.0 stays "3.0",
    // 5 stays "5.0"; only the size label uses the compact form.
    assert_eq!(
        row,
        "c1,31.5,-64.1,5.0,0.01,23.4,36.6,TN397,0.2,3.0,98.5,q1,0.2-3"
    );
}

#[test]
fn empty_joined_csv_produces_no_files() {
    let temp = tempfile::tempdir().unwrap();
    let (workspace, joined) = setup(temp.path(), "");

    let partitions = partition_joined(&joined, &workspace).unwrap();
    assert!(partitions.is_empty());
    let data_entries: Vec<_> = fs::read_dir(workspace.data_dir().as_std_path())
        .unwrap()
        .flatten()
        .collect();
    // Only the joined CSV itself.
    assert_eq!(data_entries.len(), 1);
}
