//! Export of leaf paths as a delimited table

use std::io::{Read, Write};
use std::path::Path;
use crate::tree::TaxTree;
use crate::Result;

/// Write every root-to-leaf path as a table row.
///
/// The header holds an empty cell followed by the column indices
/// `0..=depth()`; every row starts with its row index. Paths shorter than
/// the tree depth are padded with `fill`.
pub fn write_paths<W: Write>(tree: &TaxTree, writer: W, delimiter: u8, fill: &str) -> Result<()> {
    let ncol = tree.depth() + 1;
    let mut csv = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(false)
        .from_writer(writer);

    let mut header = Vec::with_capacity(ncol + 1);
    header.push(String::new());
    header.extend((0..ncol).map(|col| col.to_string()));
    csv.write_record(&header)?;

    for (row, path) in tree.dfs_nodes().iter().enumerate() {
        let mut record = Vec::with_capacity(ncol + 1);
        record.push(row.to_string());
        record.extend(path.iter().cloned());
        record.resize(ncol + 1, fill.to_string());
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write all leaf paths into a comma-separated file
pub fn save_paths_to_csv<P: AsRef<Path>>(tree: &TaxTree, path: P, fill: &str) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_paths(tree, std::io::BufWriter::new(file), b',', fill)
}

/// Read paths written by [`write_paths`].
///
/// The header and the row index column are dropped; cells that are empty
/// or equal to `fill` end the path.
pub fn read_paths<R: Read>(reader: R, delimiter: u8, fill: &str) -> Result<Vec<Vec<String>>> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let mut paths = Vec::new();
    for record in csv.records() {
        let record = record?;
        let path: Vec<String> = record
            .iter()
            .skip(1)
            .take_while(|cell| !cell.is_empty() && *cell != fill)
            .map(str::to_string)
            .collect();
        paths.push(path);
    }
    Ok(paths)
}

/// Rebuild a tree from a comma-separated path export
pub fn load_paths_from_csv<P: AsRef<Path>>(path: P, fill: &str) -> Result<TaxTree> {
    let file = std::fs::File::open(path)?;
    let paths = read_paths(std::io::BufReader::new(file), b',', fill)?;
    TaxTree::from_path_list(&paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_are_padded() {
        let tree = TaxTree::from_path_list(vec![
            vec!["root", "A", "A1"],
            vec!["root", "A", "A2"],
            vec!["root", "B"],
        ])
        .unwrap();

        let mut out = Vec::new();
        write_paths(&tree, &mut out, b',', "").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            ",0,1,2\n0,root,A,A1\n1,root,A,A2\n2,root,B,\n"
        );
    }

    #[test]
    fn test_fill_value_and_quoting() {
        let tree = TaxTree::from_path_list(vec![vec!["a,b"], vec!["c", "d"]]).unwrap();

        let mut out = Vec::new();
        write_paths(&tree, &mut out, b',', "NA").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, ",0,1,2\n0,root,\"a,b\",NA\n1,root,c,d\n");
    }

    #[test]
    fn test_save_paths_to_csv_file() {
        let tree = TaxTree::from_path_list(vec![vec!["x"]]).unwrap();
        let path = std::env::temp_dir().join("taxo_tree_test_paths.csv");

        save_paths_to_csv(&tree, &path, "").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, ",0,1\n0,root,x\n");
        assert_eq!(load_paths_from_csv(&path, "").unwrap(), tree);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_read_back_ragged_export() {
        let tree = TaxTree::from_path_list(vec![
            vec!["A", "A1"],
            vec!["A", "A2"],
            vec!["B"],
        ])
        .unwrap();

        let mut out = Vec::new();
        write_paths(&tree, &mut out, b'\t', "NA").unwrap();
        let paths = read_paths(out.as_slice(), b'\t', "NA").unwrap();
        assert_eq!(paths, tree.dfs_nodes());
        assert_eq!(TaxTree::from_path_list(&paths).unwrap(), tree);
    }
}
