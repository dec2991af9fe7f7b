use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, DataType, Reader, Xlsx, open_workbook_from_rs};
use rust_xlsxwriter::{Format, Workbook};

use crate::error::RecuperaError;

// Formatos numéricos do Excel usados ao regravar células de data.
const SHEET_DATE_FORMAT: &str = "dd/mm/yyyy";
const SHEET_DATE_TIME_FORMAT: &str = "dd/mm/yyyy hh:mm";
const SHEET_DURATION_FORMAT: &str = "[h]:mm:ss";

/// Uma aba da planilha em memória: o cabeçalho e as linhas de dados.
///
/// As células guardam o tipo original para que a aba possa ser regravada
/// sem virar texto.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Data>>,
}

impl SheetTable {
    /// Lê a aba `sheet` de um `.xlsx`.
    pub fn read(bytes: &[u8], sheet: &str) -> Result<Self, RecuperaError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(RecuperaError::SheetNotFound(sheet.to_string()));
        }
        let range = workbook.worksheet_range(sheet)?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|header| header.iter().map(|c| cell_text(c).trim().to_string()).collect())
            .unwrap_or_default();

        Ok(Self {
            name: sheet.to_string(),
            headers,
            rows: rows.map(<[Data]>::to_vec).collect(),
        })
    }

    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Linha `i` como cabeçalho → texto. Células ausentes viram `""`.
    pub fn row_map(&self, i: usize) -> HashMap<String, String> {
        let row = &self.rows[i];
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(col, h)| {
                let value = row.get(col).map(cell_text).unwrap_or_default();
                (h.clone(), value)
            })
            .collect()
    }

    pub fn row_maps(&self) -> Vec<HashMap<String, String>> {
        (0..self.rows.len()).map(|i| self.row_map(i)).collect()
    }

    /// Índice da primeira linha cuja coluna `column` vale `value`.
    pub fn find_row(&self, column: &str, value: &str) -> Option<usize> {
        let col = self.column(column)?;
        self.rows.iter().position(|row| {
            row.get(col)
                .is_some_and(|cell| cell_text(cell).trim() == value.trim())
        })
    }

    /// Altera uma célula, criando a coluna e completando a linha se preciso.
    pub fn set_cell(&mut self, row: usize, column: &str, value: Data) {
        let col = match self.column(column) {
            Some(col) => col,
            None => {
                self.headers.push(column.to_string());
                self.headers.len() - 1
            }
        };
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, Data::Empty);
        }
        cells[col] = value;
    }

    /// Grava a tabela como um `.xlsx` de uma aba só. Datas saem como datas,
    /// com formato `dd/mm/yyyy`.
    pub fn to_xlsx(&self) -> Result<Vec<u8>, RecuperaError> {
        let date = Format::new().set_num_format(SHEET_DATE_FORMAT);
        let date_time = Format::new().set_num_format(SHEET_DATE_TIME_FORMAT);
        let duration = Format::new().set_num_format(SHEET_DURATION_FORMAT);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.name)?;

        for (col, header) in self.headers.iter().enumerate() {
            sheet.write_string(0, col as u16, header)?;
        }
        for (i, row) in self.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let c = col as u16;
                match cell {
                    Data::Empty | Data::Error(_) => {}
                    Data::Int(n) => {
                        sheet.write_number(r, c, *n as f64)?;
                    }
                    Data::Float(n) => {
                        sheet.write_number(r, c, *n)?;
                    }
                    Data::Bool(b) => {
                        sheet.write_boolean(r, c, *b)?;
                    }
                    Data::DateTime(dt) => {
                        let serial = dt.as_f64();
                        let format = if dt.is_duration() {
                            &duration
                        } else if serial.fract() == 0.0 {
                            &date
                        } else {
                            &date_time
                        };
                        sheet.write_number_with_format(r, c, serial, format)?;
                    }
                    other => {
                        sheet.write_string(r, c, cell_text(other))?;
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Texto de uma célula: números inteiros perdem o `.0` e datas usam
/// `dd/MM/yyyy`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format(crate::lead::DATE_FORMAT).to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}
