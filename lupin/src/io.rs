use crate::sampler::RegressionState;
use flate2::read::GzDecoder;
use mcmc_util::McmcChain;
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
///
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let ext = Path::new(input_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let input_file = File::open(input_file)?;
            let decoder = GzDecoder::new(input_file);
            Ok(Box::new(BufReader::new(decoder)))
        }
        _ => {
            let input_file = File::open(input_file)?;
            Ok(Box::new(BufReader::new(input_file)))
        }
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not, or "stdout"
///
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    let ext = Path::new(output_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let output_file = File::create(output_file)?;
            let encoder =
                flate2::write::GzEncoder::new(output_file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => {
            let output_file = File::create(output_file)?;
            Ok(Box::new(BufWriter::new(output_file)))
        }
    }
}

/// A numeric table with optional column names
pub struct Table {
    pub columns: Vec<Box<str>>,
    pub data: DMatrix<f64>,
}

///
/// Read a whitespace/comma delimited numeric table
///
/// * `file` - file name--either gzipped or not
/// * `header` - whether the first non-comment line holds column names
///
/// Lines starting with `#` are skipped.
///
pub fn read_table(file: &str, header: bool) -> anyhow::Result<Table> {
    let buf = open_buf_reader(file)?;
    let mut columns: Vec<Box<str>> = vec![];
    let mut values: Vec<f64> = vec![];
    let mut ncol = 0;
    let mut nrow = 0;

    for (line_no, line) in buf.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let words: Vec<&str> = line
            .split(|c: char| c == '\t' || c == ',' || c == ' ')
            .filter(|w| !w.is_empty())
            .collect();

        if header && columns.is_empty() {
            columns = words.iter().map(|w| (*w).into()).collect();
            ncol = columns.len();
            continue;
        }

        if ncol == 0 {
            ncol = words.len();
        }
        if words.len() != ncol {
            anyhow::bail!(
                "{}:{}: expected {} fields, found {}",
                file,
                line_no + 1,
                ncol,
                words.len()
            );
        }
        for w in words {
            let v: f64 = w
                .parse()
                .map_err(|_| anyhow::anyhow!("{}:{}: not a number: {}", file, line_no + 1, w))?;
            values.push(v);
        }
        nrow += 1;
    }

    if nrow == 0 {
        anyhow::bail!("{}: no data rows", file);
    }
    if columns.is_empty() {
        columns = (0..ncol).map(|j| format!("V{}", j).into()).collect();
    }

    Ok(Table {
        columns,
        data: DMatrix::from_row_slice(nrow, ncol, &values),
    })
}

/// Write a numeric table with a header line
pub fn write_table(file: &str, columns: &[Box<str>], data: &DMatrix<f64>) -> anyhow::Result<()> {
    if columns.len() != data.ncols() {
        anyhow::bail!(
            "{} column names for {} columns",
            columns.len(),
            data.ncols()
        );
    }
    let mut buf = open_buf_writer(file)?;
    writeln!(buf, "{}", columns.join("\t"))?;
    for row in data.row_iter() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(buf, "{}", line.join("\t"))?;
    }
    buf.flush()?;
    Ok(())
}

///
/// Write a regression chain, one row per iteration:
/// `iter  <coefficients>  sigma2  loglik`
///
/// * `chain_id` - written as the first column when running several chains
///
pub fn write_chain(
    buf: &mut dyn Write,
    coef_names: &[Box<str>],
    chain: &McmcChain<RegressionState>,
    chain_id: Option<usize>,
    with_header: bool,
) -> anyhow::Result<()> {
    if with_header {
        let mut header: Vec<&str> = vec![];
        if chain_id.is_some() {
            header.push("chain");
        }
        header.push("iter");
        header.extend(coef_names.iter().map(|s| s.as_ref()));
        header.push("sigma2");
        header.push("loglik");
        writeln!(buf, "{}", header.join("\t"))?;
    }

    for (i, (state, llik)) in chain
        .samples()
        .iter()
        .zip(chain.log_likelihoods())
        .enumerate()
    {
        let mut words: Vec<String> = vec![];
        if let Some(c) = chain_id {
            words.push(c.to_string());
        }
        words.push((i + 1).to_string());
        words.extend(state.coefficients.iter().map(|b| b.to_string()));
        words.push(state.residual_variance.to_string());
        words.push(llik.to_string());
        writeln!(buf, "{}", words.join("\t"))?;
    }
    Ok(())
}
