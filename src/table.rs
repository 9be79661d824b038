//! Tabular dataset type for datamorph.
//!
//! Provides the [`Table`] type: an in-memory tabular dataset backed by Arrow
//! `RecordBatch`es, with readers and writers for CSV, JSON (array or
//! newline-delimited) and Excel workbooks.

use std::{path::Path, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema, SchemaRef},
};

use crate::error::{Error, Result};

/// An in-memory tabular dataset backed by Arrow RecordBatches.
///
/// This is the single data model of datamorph: an ordered collection of named
/// columns, each holding values of one Arrow type with per-cell null markers.
/// Tables are created by reading an input file, replaced (never mutated in
/// place) by cleaning, and discarded after the output is written.
///
/// # Example
///
/// ```no_run
/// use datamorph::Table;
///
/// let table = Table::read("data.csv").unwrap();
/// println!("Table has {} rows", table.len());
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    batches: Vec<RecordBatch>,
    schema: SchemaRef,
    row_count: usize,
}

impl Table {
    /// Creates a new Table from a vector of RecordBatches.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The batches vector is empty
    /// - The batches have inconsistent schemas
    pub fn new(batches: Vec<RecordBatch>) -> Result<Self> {
        if batches.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let schema = batches[0].schema();

        // Verify all batches have the same schema
        for (i, batch) in batches.iter().enumerate().skip(1) {
            if batch.schema() != schema {
                return Err(Error::schema_mismatch(format!(
                    "Batch {} has different schema than batch 0",
                    i
                )));
            }
        }

        let row_count = batches.iter().map(|b| b.num_rows()).sum();

        Ok(Self {
            batches,
            schema,
            row_count,
        })
    }

    /// Creates a Table from a single RecordBatch.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is empty.
    pub fn from_batch(batch: RecordBatch) -> Result<Self> {
        Self::new(vec![batch])
    }

    /// Reads a data file, dispatching on its extension.
    ///
    /// Supported extensions: `csv`, `xlsx`, `xls`, `json`, `jsonl`, `ndjson`.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is unsupported or parsing fails.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Self::from_csv(path),
            "xlsx" | "xls" => Self::from_excel(path),
            "json" | "jsonl" | "ndjson" => Self::from_json(path),
            ext => Err(Error::unsupported_format(ext)),
        }
    }

    /// Writes the table to a file, dispatching on its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is unsupported or writing fails.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => self.to_csv(path),
            "xlsx" | "xls" => self.to_excel(path),
            "json" | "jsonl" | "ndjson" => self.to_json(path),
            ext => Err(Error::unsupported_format(ext)),
        }
    }

    /// Loads a table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened
    /// - The file is not valid CSV
    /// - The file is empty
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_csv_with_options(path, CsvOptions::default())
    }

    /// Loads a table from a CSV file with options.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the file is empty.
    pub fn from_csv_with_options(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        use std::io::{BufReader, Seek, SeekFrom};

        use arrow_csv::{reader::Format, ReaderBuilder};

        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        let mut buf_reader = BufReader::new(file);

        // Get schema (infer or use provided)
        let schema = if let Some(schema) = options.schema {
            Arc::new(schema)
        } else {
            let mut format = Format::default().with_header(options.has_header);
            if let Some(delim) = options.delimiter {
                format = format.with_delimiter(delim);
            }
            let (inferred, _) = format
                .infer_schema(&mut buf_reader, Some(1000))
                .map_err(Error::Arrow)?;

            buf_reader
                .seek(SeekFrom::Start(0))
                .map_err(|e| Error::io(e, path))?;

            Arc::new(inferred)
        };

        let mut builder = ReaderBuilder::new(schema)
            .with_batch_size(options.batch_size)
            .with_header(options.has_header);

        if let Some(delim) = options.delimiter {
            builder = builder.with_delimiter(delim);
        }

        let reader = builder.build(buf_reader).map_err(Error::Arrow)?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Arrow)?;

        if batches.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Self::new(batches)
    }

    /// Saves the table to a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        use arrow_csv::WriterBuilder;

        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(e, path))?;

        let mut writer = WriterBuilder::new().with_header(true).build(file);

        for batch in &self.batches {
            writer.write(batch).map_err(Error::Arrow)?;
        }

        Ok(())
    }

    /// Loads a table from a JSON file.
    ///
    /// Both newline-delimited objects and a top-level array of objects are
    /// accepted; the variant is sniffed from the first non-whitespace byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_with_options(path, JsonOptions::default())
    }

    /// Loads a table from a JSON file with options.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the file is empty.
    pub fn from_json_with_options(path: impl AsRef<Path>, options: JsonOptions) -> Result<Self> {
        use std::io::{BufReader, Read};

        let path = path.as_ref();

        // Sniff the leading bytes to distinguish an array document from
        // newline-delimited records.
        let mut head = [0u8; 1024];
        let n = {
            let mut file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
            file.read(&mut head).map_err(|e| Error::io(e, path))?
        };
        let is_array = head[..n]
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'[');

        if is_array {
            let text = std::fs::read_to_string(path).map_err(|e| Error::io(e, path))?;
            return Self::from_json_array_str(&text, options);
        }

        use arrow_json::ReaderBuilder;

        // Get schema (infer or use provided)
        let schema = if let Some(schema) = options.schema {
            Arc::new(schema)
        } else {
            let infer_file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
            let infer_reader = BufReader::new(infer_file);
            let (inferred, _) = arrow_json::reader::infer_json_schema(infer_reader, Some(1000))
                .map_err(Error::Arrow)?;
            Arc::new(inferred)
        };

        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        let buf_reader = BufReader::new(file);

        let builder = ReaderBuilder::new(schema).with_batch_size(options.batch_size);
        let reader = builder.build(buf_reader).map_err(Error::Arrow)?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Arrow)?;

        if batches.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Self::new(batches)
    }

    /// Saves the table as newline-delimited JSON, one object per row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<()> {
        use std::io::BufWriter;

        use arrow_json::LineDelimitedWriter;

        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(e, path))?;
        let buf_writer = BufWriter::new(file);

        let mut writer = LineDelimitedWriter::new(buf_writer);

        for batch in &self.batches {
            writer.write(batch).map_err(Error::Arrow)?;
        }

        writer.finish().map_err(Error::Arrow)?;

        Ok(())
    }

    /// Loads a table from the first worksheet of an Excel workbook.
    ///
    /// The first row is taken as the header. Columns are typed by parse-all
    /// inference over the stringified cells (Int64, Float64, Boolean, Utf8).
    ///
    /// # Errors
    ///
    /// Returns an error if the workbook cannot be opened or has no data rows.
    pub fn from_excel(path: impl AsRef<Path>) -> Result<Self> {
        use calamine::{open_workbook_auto, Data, Reader};

        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(Error::EmptyDataset)??;

        let mut rows = range.rows();
        let header_row = rows.next().ok_or(Error::EmptyDataset)?;

        let headers: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name = cell.to_string();
                if name.trim().is_empty() {
                    format!("column_{}", i)
                } else {
                    name
                }
            })
            .collect();

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        let mut has_rows = false;

        for row in rows {
            has_rows = true;
            for (i, col) in columns.iter_mut().enumerate() {
                let value = match row.get(i) {
                    None | Some(Data::Empty) => None,
                    Some(Data::String(s)) => Some(s.clone()),
                    Some(Data::Bool(b)) => Some(b.to_string()),
                    Some(other) => Some(other.to_string()),
                };
                col.push(value);
            }
        }

        if !has_rows {
            return Err(Error::EmptyDataset);
        }

        let batch = batch_from_string_columns(&headers, &columns)?;
        Self::from_batch(batch)
    }

    /// Saves the table as an Excel workbook with a single worksheet.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the workbook fails.
    pub fn to_excel(&self, path: impl AsRef<Path>) -> Result<()> {
        use rust_xlsxwriter::Workbook;

        let path = path.as_ref();
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, field) in self.schema.fields().iter().enumerate() {
            worksheet.write_string(0, col_index(col)?, field.name())?;
        }

        let mut row: u32 = 1;
        for batch in &self.batches {
            for i in 0..batch.num_rows() {
                for (col_idx, array) in batch.columns().iter().enumerate() {
                    let col = col_index(col_idx)?;
                    if array.is_null(i) {
                        continue;
                    }
                    if let Some(arr) = array.as_any().downcast_ref::<Int64Array>() {
                        #[allow(clippy::cast_precision_loss)]
                        worksheet.write_number(row, col, arr.value(i) as f64)?;
                    } else if let Some(arr) = array.as_any().downcast_ref::<Float64Array>() {
                        worksheet.write_number(row, col, arr.value(i))?;
                    } else if let Some(arr) = array.as_any().downcast_ref::<BooleanArray>() {
                        worksheet.write_boolean(row, col, arr.value(i))?;
                    } else if let Some(arr) = array.as_any().downcast_ref::<StringArray>() {
                        worksheet.write_string(row, col, arr.value(i))?;
                    } else if let Some(value) = array_value_string(array, i) {
                        worksheet.write_string(row, col, &value)?;
                    }
                }
                row += 1;
            }
        }

        workbook.save(path)?;
        Ok(())
    }

    /// Loads a table from a CSV string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid CSV.
    pub fn from_csv_str(data: &str) -> Result<Self> {
        use std::io::Cursor;

        use arrow_csv::{reader::Format, ReaderBuilder};

        // Infer schema
        let mut cursor_for_infer = Cursor::new(data.as_bytes());
        let format = Format::default().with_header(true);
        let (inferred, _) = format
            .infer_schema(&mut cursor_for_infer, Some(1000))
            .map_err(Error::Arrow)?;

        let schema = Arc::new(inferred);
        let cursor = Cursor::new(data.as_bytes());

        let builder = ReaderBuilder::new(schema)
            .with_batch_size(8192)
            .with_header(true);

        let reader = builder.build(cursor).map_err(Error::Arrow)?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Arrow)?;

        if batches.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Self::new(batches)
    }

    /// Loads a table from a JSON string, array or newline-delimited.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid JSON.
    pub fn from_json_str(data: &str) -> Result<Self> {
        if data.trim_start().starts_with('[') {
            return Self::from_json_array_str(data, JsonOptions::default());
        }

        use std::io::Cursor;

        use arrow_json::ReaderBuilder;

        // Infer schema
        let cursor_for_infer = Cursor::new(data.as_bytes());
        let (inferred, _) = arrow_json::reader::infer_json_schema(cursor_for_infer, Some(1000))
            .map_err(Error::Arrow)?;

        let schema = Arc::new(inferred);
        let cursor = Cursor::new(data.as_bytes());

        let builder = ReaderBuilder::new(schema).with_batch_size(8192);
        let reader = builder.build(cursor).map_err(Error::Arrow)?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Arrow)?;

        if batches.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Self::new(batches)
    }

    /// Parses a JSON array document by flattening it to newline-delimited
    /// records. Nested objects are flattened into dotted column names.
    fn from_json_array_str(data: &str, options: JsonOptions) -> Result<Self> {
        use std::io::Cursor;

        use arrow_json::ReaderBuilder;

        let values: Vec<serde_json::Value> = serde_json::from_str(data)?;
        if values.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let mut lines = String::new();
        for value in &values {
            let flat = flatten_json_object(value);
            lines.push_str(&serde_json::to_string(&flat)?);
            lines.push('\n');
        }

        let schema = if let Some(schema) = options.schema {
            Arc::new(schema)
        } else {
            let cursor_for_infer = Cursor::new(lines.as_bytes());
            let (inferred, _) = arrow_json::reader::infer_json_schema(cursor_for_infer, None)
                .map_err(Error::Arrow)?;
            Arc::new(inferred)
        };

        let cursor = Cursor::new(lines.as_bytes());
        let builder = ReaderBuilder::new(schema).with_batch_size(options.batch_size);
        let reader = builder.build(cursor).map_err(Error::Arrow)?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Arrow)?;

        if batches.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Self::new(batches)
    }

    /// Returns the total number of rows in the table.
    pub fn len(&self) -> usize {
        self.row_count
    }

    /// Returns true if the table contains no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Returns the schema of the table.
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Returns the underlying batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Consumes the table and returns the underlying batches.
    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }

    /// Projects every column to stringified cells, preserving schema order.
    ///
    /// Nulls stay `None`; all other values are rendered the way Arrow would
    /// display them. This is the representation the cleaning pipeline and
    /// the type detector operate on.
    pub fn string_columns(&self) -> Vec<(String, Vec<Option<String>>)> {
        let mut columns: Vec<(String, Vec<Option<String>>)> = self
            .schema
            .fields()
            .iter()
            .map(|f| (f.name().clone(), Vec::with_capacity(self.row_count)))
            .collect();

        for batch in &self.batches {
            for (col_idx, (_, values)) in columns.iter_mut().enumerate() {
                let array = batch.column(col_idx);
                for i in 0..array.len() {
                    values.push(array_value_string(array, i));
                }
            }
        }

        columns
    }
}

/// Converts a column index to the u16 Excel expects.
fn col_index(col: usize) -> Result<u16> {
    u16::try_from(col)
        .map_err(|_| Error::invalid_config(format!("Too many columns for Excel: {}", col + 1)))
}

/// Renders a single array value as a string, `None` for nulls.
pub(crate) fn array_value_string(array: &ArrayRef, i: usize) -> Option<String> {
    use arrow::array::{Float32Array, Int32Array};

    if array.is_null(i) {
        return None;
    }

    if let Some(arr) = array.as_any().downcast_ref::<StringArray>() {
        Some(arr.value(i).to_string())
    } else if let Some(arr) = array.as_any().downcast_ref::<Int64Array>() {
        Some(arr.value(i).to_string())
    } else if let Some(arr) = array.as_any().downcast_ref::<Int32Array>() {
        Some(arr.value(i).to_string())
    } else if let Some(arr) = array.as_any().downcast_ref::<Float64Array>() {
        Some(arr.value(i).to_string())
    } else if let Some(arr) = array.as_any().downcast_ref::<Float32Array>() {
        Some(arr.value(i).to_string())
    } else if let Some(arr) = array.as_any().downcast_ref::<BooleanArray>() {
        Some(arr.value(i).to_string())
    } else {
        // Dates, timestamps and anything else go through Arrow's display path
        arrow::util::display::array_value_to_string(array, i).ok()
    }
}

/// Builds a typed RecordBatch from stringified columns.
///
/// Each column becomes Int64 when every non-null value parses as an integer,
/// Float64 when every non-null value parses as a float, Boolean when every
/// non-null value is `true`/`false`, and Utf8 otherwise.
pub(crate) fn batch_from_string_columns(
    headers: &[String],
    columns: &[Vec<Option<String>>],
) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(headers.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(headers.len());

    for (name, values) in headers.iter().zip(columns.iter()) {
        let non_null: Vec<&str> = values.iter().filter_map(|v| v.as_deref()).collect();

        let all_int =
            !non_null.is_empty() && non_null.iter().all(|v| v.trim().parse::<i64>().is_ok());
        let all_float =
            !non_null.is_empty() && non_null.iter().all(|v| v.trim().parse::<f64>().is_ok());
        let all_bool = !non_null.is_empty()
            && non_null
                .iter()
                .all(|v| matches!(v.trim(), "true" | "false"));

        let (dtype, array): (DataType, ArrayRef) = if all_int {
            let ints: Vec<Option<i64>> = values
                .iter()
                .map(|v| v.as_deref().and_then(|s| s.trim().parse().ok()))
                .collect();
            (DataType::Int64, Arc::new(Int64Array::from(ints)))
        } else if all_float {
            let floats: Vec<Option<f64>> = values
                .iter()
                .map(|v| v.as_deref().and_then(|s| s.trim().parse().ok()))
                .collect();
            (DataType::Float64, Arc::new(Float64Array::from(floats)))
        } else if all_bool {
            let bools: Vec<Option<bool>> = values
                .iter()
                .map(|v| v.as_deref().map(|s| s.trim() == "true"))
                .collect();
            (DataType::Boolean, Arc::new(BooleanArray::from(bools)))
        } else {
            let strings: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
            (DataType::Utf8, Arc::new(StringArray::from(strings)))
        };

        fields.push(Field::new(name, dtype, true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, arrays).map_err(Error::Arrow)
}

/// Flattens one level of nested objects into dotted keys, the way array
/// documents are normalized before ingestion.
fn flatten_json_object(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::{Map, Value};

    let Value::Object(map) = value else {
        return value.clone();
    };

    let mut flat = Map::new();
    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                for (inner_key, inner_val) in inner {
                    flat.insert(format!("{}.{}", key, inner_key), inner_val.clone());
                }
            }
            other => {
                flat.insert(key.clone(), other.clone());
            }
        }
    }

    Value::Object(flat)
}

/// Options for CSV parsing.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row.
    pub has_header: bool,
    /// Delimiter character (default is comma).
    pub delimiter: Option<u8>,
    /// Batch size for reading.
    pub batch_size: usize,
    /// Optional schema (inferred if not provided).
    pub schema: Option<Schema>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: None, // Use default comma
            batch_size: 8192,
            schema: None,
        }
    }
}

impl CsvOptions {
    /// Creates new CSV options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the file has a header row.
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Sets the delimiter character.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Sets the batch size for reading.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the schema for parsing.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Options for JSON parsing.
#[derive(Debug, Clone)]
pub struct JsonOptions {
    /// Batch size for reading.
    pub batch_size: usize,
    /// Optional schema (inferred if not provided).
    pub schema: Option<Schema>,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            schema: None,
        }
    }
}

impl JsonOptions {
    /// Creates new JSON options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the batch size for reading.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the schema for parsing.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[cfg(test)]
#[allow(clippy::uninlined_format_args)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Int32Array, StringArray},
        datatypes::{DataType, Field, Schema},
    };

    use super::*;

    fn create_test_batch(start: i32, count: usize) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("name", DataType::Utf8, false),
        ]));

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let ids: Vec<i32> = (start..start + count as i32).collect();
        let names: Vec<String> = ids.iter().map(|i| format!("item_{}", i)).collect();

        let id_array = Int32Array::from(ids);
        let name_array = StringArray::from(names);

        RecordBatch::try_new(schema, vec![Arc::new(id_array), Arc::new(name_array)])
            .ok()
            .unwrap_or_else(|| panic!("Failed to create test batch"))
    }

    #[test]
    fn test_new_table() {
        let batch = create_test_batch(0, 10);
        let table = Table::new(vec![batch]).ok();
        assert!(table.is_some());
        let table = table.unwrap_or_else(|| panic!("Table should be Some"));
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn test_empty_table_error() {
        let result = Table::new(vec![]);
        assert!(matches!(result, Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_from_batch() {
        let batch = create_test_batch(0, 5);
        let table = Table::from_batch(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should create table"));
        assert_eq!(table.len(), 5);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_schema_mismatch_error() {
        let schema1 = Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]));
        let schema2 = Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, false)]));

        let batch1 = RecordBatch::try_new(schema1, vec![Arc::new(Int32Array::from(vec![1, 2, 3]))])
            .ok()
            .unwrap_or_else(|| panic!("Should create batch"));

        let batch2 = RecordBatch::try_new(
            schema2,
            vec![Arc::new(StringArray::from(vec!["a", "b", "c"]))],
        )
        .ok()
        .unwrap_or_else(|| panic!("Should create batch"));

        let result = Table::new(vec![batch1, batch2]);
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_roundtrip() {
        let batch = create_test_batch(0, 10);
        let table = Table::from_batch(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should create table"));

        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = temp_dir.path().join("test.csv");

        table
            .to_csv(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should write csv"));

        let loaded = Table::from_csv(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should load csv"));

        assert_eq!(loaded.len(), table.len());
    }

    #[test]
    fn test_json_roundtrip() {
        let batch = create_test_batch(0, 10);
        let table = Table::from_batch(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should create table"));

        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = temp_dir.path().join("test.jsonl");

        table
            .to_json(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should write json"));

        let loaded = Table::from_json(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should load json"));

        assert_eq!(loaded.len(), table.len());
    }

    #[test]
    fn test_excel_roundtrip() {
        let batch = create_test_batch(0, 10);
        let table = Table::from_batch(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should create table"));

        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = temp_dir.path().join("test.xlsx");

        table
            .to_excel(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should write xlsx"));

        let loaded = Table::from_excel(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should load xlsx"));

        assert_eq!(loaded.len(), table.len());
        assert_eq!(loaded.schema().fields().len(), 2);
    }

    #[test]
    fn test_read_write_dispatch() {
        let batch = create_test_batch(0, 4);
        let table = Table::from_batch(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should create table"));

        let temp_dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = temp_dir.path().join("test.csv");

        table
            .write(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should write"));
        let loaded = Table::read(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should read"));
        assert_eq!(loaded.len(), 4);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = Table::read("/tmp/data.parquet");
        assert!(matches!(result, Err(Error::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_from_csv_error() {
        let result = Table::from_csv("/nonexistent/path/to/file.csv");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_str_ndjson() {
        let data = "{\"a\": 1, \"b\": \"x\"}\n{\"a\": 2, \"b\": \"y\"}\n";
        let table = Table::from_json_str(data)
            .ok()
            .unwrap_or_else(|| panic!("Should parse ndjson"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_from_json_str_array() {
        let data = "[{\"a\": 1, \"b\": \"x\"}, {\"a\": 2, \"b\": \"y\"}]";
        let table = Table::from_json_str(data)
            .ok()
            .unwrap_or_else(|| panic!("Should parse array"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_from_json_str_array_nested() {
        let data =
            "[{\"a\": 1, \"meta\": {\"tag\": \"x\"}}, {\"a\": 2, \"meta\": {\"tag\": \"y\"}}]";
        let table = Table::from_json_str(data)
            .ok()
            .unwrap_or_else(|| panic!("Should parse nested array"));
        assert_eq!(table.len(), 2);
        assert!(table.schema().field_with_name("meta.tag").is_ok());
    }

    #[test]
    fn test_from_csv_str() {
        let data = "a,b\n1,x\n2,y\n";
        let table = Table::from_csv_str(data)
            .ok()
            .unwrap_or_else(|| panic!("Should parse csv"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.schema().fields().len(), 2);
    }

    #[test]
    fn test_string_columns_order_and_nulls() {
        let data = "a,b\n1,x\n,y\n";
        let table = Table::from_csv_str(data)
            .ok()
            .unwrap_or_else(|| panic!("Should parse csv"));

        let columns = table.string_columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].0, "a");
        assert_eq!(columns[1].0, "b");
        assert_eq!(columns[0].1[0].as_deref(), Some("1"));
        assert!(columns[0].1[1].is_none());
        assert_eq!(columns[1].1[1].as_deref(), Some("y"));
    }

    #[test]
    fn test_batch_from_string_columns_types() {
        let headers = vec![
            "i".to_string(),
            "f".to_string(),
            "b".to_string(),
            "s".to_string(),
        ];
        let columns = vec![
            vec![Some("1".to_string()), Some("2".to_string())],
            vec![Some("1.5".to_string()), None],
            vec![Some("true".to_string()), Some("false".to_string())],
            vec![Some("x".to_string()), Some("y".to_string())],
        ];

        let batch = batch_from_string_columns(&headers, &columns)
            .ok()
            .unwrap_or_else(|| panic!("Should build batch"));

        assert_eq!(batch.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Float64);
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Boolean);
        assert_eq!(batch.schema().field(3).data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_csv_options() {
        let options = CsvOptions::new()
            .with_header(true)
            .with_delimiter(b';')
            .with_batch_size(1024);

        assert!(options.has_header);
        assert_eq!(options.delimiter, Some(b';'));
        assert_eq!(options.batch_size, 1024);
    }

    #[test]
    fn test_json_options_default() {
        let options = JsonOptions::default();
        assert_eq!(options.batch_size, 8192);
        assert!(options.schema.is_none());
    }

    #[test]
    fn test_clone() {
        let batch = create_test_batch(0, 5);
        let table = Table::from_batch(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should create table"));

        let cloned = table.clone();
        assert_eq!(cloned.len(), table.len());
        assert_eq!(cloned.schema(), table.schema());
    }

    #[test]
    fn test_into_batches() {
        let batch = create_test_batch(0, 5);
        let table = Table::from_batch(batch)
            .ok()
            .unwrap_or_else(|| panic!("Should create table"));

        let batches = table.into_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_rows(), 5);
    }
}
