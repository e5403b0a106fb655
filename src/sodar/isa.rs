/*!
 * ISA-tab study and assay tables
 *
 * Only what the raw data pull needs: the batch number of each sample from
 * the study tables and the library folder of each sample from the assay
 * tables. Tables are tab-separated with one header line; cells may be
 * double-quoted.
 */

use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::models::SampleSheet;
use crate::error::{Result, SeqportError};

const SAMPLE_NAME: &str = "Sample Name";
const LIBRARY_NAME: &str = "Library Name";
const BATCH_COLUMNS: [&str; 2] = ["Characteristics[Batch]", "Comment[Batch]"];
const FOLDER_SUFFIX: &str = "[Folder name]";

/// Parsed TSV table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsaTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl IsaTable {
    pub fn parse(tsv: &str) -> Result<Self> {
        let mut lines = tsv
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty() && !line.starts_with('#'));

        let header = lines
            .next()
            .map(split_row)
            .ok_or_else(|| SeqportError::Metadata("empty ISA-tab table".to_string()))?;
        let rows = lines.map(split_row).collect();

        Ok(Self { header, rows })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of the first column named exactly `name`
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    fn first_column_of(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| self.column(name))
    }

    fn column_ending_with(&self, suffix: &str) -> Option<usize> {
        self.header.iter().position(|h| h.ends_with(suffix))
    }

    fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(String::as_str).unwrap_or("")
    }
}

fn split_row(line: &str) -> Vec<String> {
    line.split('\t')
        .map(|cell| {
            let cell = cell.trim();
            cell.strip_prefix('"')
                .and_then(|c| c.strip_suffix('"'))
                .unwrap_or(cell)
                .to_string()
        })
        .collect()
}

/// Library, its remote folder and the batch of its sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryInfo {
    pub library_name: String,
    pub folder_name: String,
    pub sample_name: String,
    pub batch_no: Option<u32>,
}

/// Library name to folder mapping for one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFolderMapping {
    libraries: BTreeMap<String, LibraryInfo>,
}

impl RemoteFolderMapping {
    /// Build the mapping from raw study and assay TSV texts.
    ///
    /// Tables that cannot be used are logged and skipped.
    pub fn from_tables<'a, S, A>(studies: S, assays: A) -> Self
    where
        S: IntoIterator<Item = &'a str>,
        A: IntoIterator<Item = &'a str>,
    {
        let mut batches: BTreeMap<String, Option<u32>> = BTreeMap::new();
        for tsv in studies {
            match IsaTable::parse(tsv) {
                Ok(table) => collect_batches(&table, &mut batches),
                Err(e) => warn!("Skipping study table: {}", e),
            }
        }

        let mut libraries = BTreeMap::new();
        for tsv in assays {
            match IsaTable::parse(tsv) {
                Ok(table) => collect_libraries(&table, &batches, &mut libraries),
                Err(e) => warn!("Skipping assay table: {}", e),
            }
        }

        Self { libraries }
    }

    pub fn from_sample_sheet(sheet: &SampleSheet) -> Self {
        Self::from_tables(
            sheet.studies.iter().map(|(_, f)| f.tsv.as_str()),
            sheet.assays.iter().map(|(_, f)| f.tsv.as_str()),
        )
    }

    /// Keep libraries whose sample has a batch number of at least `min_batch`.
    /// Libraries without a batch number are dropped.
    pub fn filter_min_batch(&self, min_batch: u32) -> Self {
        let libraries = self
            .libraries
            .iter()
            .filter(|(_, info)| info.batch_no.is_some_and(|b| b >= min_batch))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { libraries }
    }

    pub fn get(&self, library_name: &str) -> Option<&LibraryInfo> {
        self.libraries.get(library_name)
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Libraries sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &LibraryInfo> {
        self.libraries.values()
    }
}

fn collect_batches(table: &IsaTable, batches: &mut BTreeMap<String, Option<u32>>) {
    let Some(sample_col) = table.column(SAMPLE_NAME) else {
        warn!("Study table has no '{}' column", SAMPLE_NAME);
        return;
    };
    let batch_col = table.first_column_of(&BATCH_COLUMNS);
    if batch_col.is_none() {
        warn!("Study table has no batch column");
    }

    for row in table.rows() {
        let sample = IsaTable::cell(row, sample_col);
        if sample.is_empty() {
            continue;
        }
        let batch = batch_col.and_then(|idx| parse_batch(sample, IsaTable::cell(row, idx)));
        batches.insert(sample.to_string(), batch);
    }
}

fn parse_batch(sample: &str, value: &str) -> Option<u32> {
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(batch) => Some(batch),
        Err(_) => {
            warn!("Sample {} has non-numeric batch '{}'", sample, value);
            None
        }
    }
}

fn collect_libraries(
    table: &IsaTable,
    batches: &BTreeMap<String, Option<u32>>,
    libraries: &mut BTreeMap<String, LibraryInfo>,
) {
    let (Some(sample_col), Some(library_col)) =
        (table.column(SAMPLE_NAME), table.column(LIBRARY_NAME))
    else {
        warn!("Assay table lacks '{}' or '{}' column", SAMPLE_NAME, LIBRARY_NAME);
        return;
    };
    let Some(folder_col) = table.column_ending_with(FOLDER_SUFFIX) else {
        warn!("Assay table has no folder name column");
        return;
    };

    for row in table.rows() {
        let library = IsaTable::cell(row, library_col);
        if library.is_empty() {
            continue;
        }
        let sample = IsaTable::cell(row, sample_col);
        let folder = IsaTable::cell(row, folder_col);
        if folder.is_empty() {
            warn!("Library {} has no folder name, skipping", library);
            continue;
        }
        let batch_no = match batches.get(sample) {
            Some(batch) => *batch,
            None => {
                warn!("Sample {} of library {} not found in any study", sample, library);
                None
            }
        };
        debug!("Library {} -> folder {} (batch {:?})", library, folder, batch_no);
        libraries.insert(
            library.to_string(),
            LibraryInfo {
                library_name: library.to_string(),
                folder_name: folder.to_string(),
                sample_name: sample.to_string(),
                batch_no,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDY: &str = "Source Name\tCharacteristics[Batch]\tProtocol REF\tSample Name\n\
        \"index\"\t\"1\"\tSample collection\t\"index-N1\"\n\
        father\t2\tSample collection\tfather-N1\n\
        mother\t\tSample collection\tmother-N1\n\
        cousin\tx\tSample collection\tcousin-N1\n";

    const ASSAY: &str = "Sample Name\tProtocol REF\tLibrary Name\tCharacteristics[Library source]\tComment[Folder name]\n\
        index-N1\tLibrary construction\tindex-N1-DNA1-WES1\tGENOMIC\tIDX01\n\
        father-N1\tLibrary construction\tfather-N1-DNA1-WES1\tGENOMIC\tFAT01\n\
        mother-N1\tLibrary construction\tmother-N1-DNA1-WES1\tGENOMIC\tMOT01\n\
        cousin-N1\tLibrary construction\tcousin-N1-DNA1-WES1\tGENOMIC\tCOU01\n\
        ghost-N1\tLibrary construction\tghost-N1-DNA1-WES1\tGENOMIC\tGHO01\n\
        index-N1\tLibrary construction\t\tGENOMIC\t\n";

    fn mapping() -> RemoteFolderMapping {
        RemoteFolderMapping::from_tables([STUDY], [ASSAY])
    }

    #[test]
    fn test_parse_table_strips_quotes_and_comments() {
        let table = IsaTable::parse("# comment\n\"A\"\tB\n\n1\t\"2\"\n").unwrap();
        assert_eq!(table.header(), ["A", "B"]);
        assert_eq!(table.rows(), [vec!["1".to_string(), "2".to_string()]]);
        assert_eq!(table.column("B"), Some(1));
    }

    #[test]
    fn test_parse_empty_table() {
        assert!(matches!(IsaTable::parse("\n\n"), Err(SeqportError::Metadata(_))));
    }

    #[test]
    fn test_library_mapping() {
        let mapping = mapping();
        assert_eq!(mapping.len(), 5);
        let index = mapping.get("index-N1-DNA1-WES1").unwrap();
        assert_eq!(index.folder_name, "IDX01");
        assert_eq!(index.sample_name, "index-N1");
        assert_eq!(index.batch_no, Some(1));
        assert_eq!(mapping.get("mother-N1-DNA1-WES1").unwrap().batch_no, None);
        assert_eq!(mapping.get("cousin-N1-DNA1-WES1").unwrap().batch_no, None);
        assert_eq!(mapping.get("ghost-N1-DNA1-WES1").unwrap().batch_no, None);
    }

    #[test]
    fn test_filter_min_batch() {
        let all = mapping().filter_min_batch(0);
        let names: Vec<&str> = all.iter().map(|l| l.library_name.as_str()).collect();
        assert_eq!(names, ["father-N1-DNA1-WES1", "index-N1-DNA1-WES1"]);

        let late = mapping().filter_min_batch(2);
        assert_eq!(late.len(), 1);
        assert!(late.get("father-N1-DNA1-WES1").is_some());

        assert!(mapping().filter_min_batch(3).is_empty());
    }

    #[test]
    fn test_comment_batch_column() {
        let study = "Source Name\tComment[Batch]\tSample Name\ns1\t4\ts1-N1\n";
        let assay =
            "Sample Name\tLibrary Name\tParameter Value[Folder name]\ns1-N1\ts1-N1-DNA1\tF1\n";
        let mapping = RemoteFolderMapping::from_tables([study], [assay]);
        assert_eq!(mapping.get("s1-N1-DNA1").unwrap().batch_no, Some(4));
    }

    #[test]
    fn test_malformed_tables_contribute_nothing() {
        let mapping = RemoteFolderMapping::from_tables(
            ["", "Foo\tBar\n"],
            ["Sample Name\tLibrary Name\n"],
        );
        assert!(mapping.is_empty());
    }
}
