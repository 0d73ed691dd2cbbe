use crate::{config::Config, error::RequestError, forms::extension};
use chrono::{Local, NaiveDateTime};
use multipart::server::Multipart;
use rand::{Rng, rng};
use std::{
    fs::{OpenOptions, create_dir, create_dir_all, remove_dir_all, rename},
    io::{self, Read},
    path::{Path, PathBuf},
};

pub const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const STAMP_LEN: usize = 19;
const CLAIM_ATTEMPTS: usize = 16;
const FALLBACK_FORM_NAME: &str = "unnamed";
const STAGING_DIR_NAME: &str = ".incoming";

#[derive(Debug)]
pub struct StoredSubmission {
    pub directory: PathBuf,
    pub files: Vec<String>,
}

pub fn boundary(content_type: &str) -> Option<String> {
    let (_, parameters) = content_type.split_once("boundary=")?;
    let boundary = parameters
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('"');

    (!boundary.is_empty()).then(|| boundary.to_string())
}

pub fn accept(
    config: &Config,
    body: impl Read,
    boundary: &str,
) -> Result<StoredSubmission, RequestError> {
    let staging = claim_staging_dir(config)?;
    let result = store(config, body, boundary, &staging);

    // Success leaves the staging directory empty; failure leaves staged parts in it
    let _ = remove_dir_all(&staging);

    result
}

fn store(
    config: &Config,
    body: impl Read,
    boundary: &str,
    staging: &Path,
) -> Result<StoredSubmission, RequestError> {
    let files = stage_parts(config, body, boundary, staging)?;

    if files.is_empty() {
        return Err(RequestError::BadRequest("submission carried no files".into()));
    }

    let (form_name, stamp) = classify(&files);
    let form_dir = config.data_dir.join(form_name);
    create_dir_all(&form_dir)?;

    let directory = claim_new_dir(&form_dir, &stamp)?;

    for name in &files {
        rename(staging.join(name), directory.join(name))?;
    }

    Ok(StoredSubmission { directory, files })
}

fn stage_parts(
    config: &Config,
    body: impl Read,
    boundary: &str,
    staging: &Path,
) -> Result<Vec<String>, RequestError> {
    let mut multipart = Multipart::with_body(body, boundary);
    let mut files: Vec<String> = vec![];

    while let Some(mut entry) = multipart
        .read_entry()
        .map_err(|error| RequestError::BadRequest(format!("unreadable multipart body: {error}")))?
    {
        // Parts without a file name are plain form fields
        let Some(file_name) = entry.headers.filename.clone() else {
            continue;
        };

        // Browsers post an empty file name for each unused file input
        if file_name.is_empty() {
            continue;
        }

        let name = base_name(&file_name)?;
        let file_extension = extension(&name).unwrap_or_default();

        if !config.allows(file_extension) {
            return Err(RequestError::TypeNotAllowed(file_extension.to_string()));
        }

        if files.contains(&name) {
            return Err(RequestError::BadRequest(format!(
                "duplicate file \"{name}\" in submission"
            )));
        }

        let mut staged = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(staging.join(&name))?;
        io::copy(&mut entry.data, &mut staged)?;

        files.push(name);
    }

    Ok(files)
}

fn base_name(raw: &str) -> Result<String, RequestError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(RequestError::BadRequest(format!("unusable file name \"{raw}\"")));
    }

    Ok(base.to_string())
}

fn classify(files: &[String]) -> (String, String) {
    for name in files {
        let is_xml = extension(name).is_some_and(|extension| extension.eq_ignore_ascii_case("xml"));

        if !is_xml {
            continue;
        }

        let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);

        if let Some(parsed) = split_stamped_name(stem) {
            return parsed;
        }
    }

    (
        FALLBACK_FORM_NAME.into(),
        Local::now().format(STAMP_FORMAT).to_string(),
    )
}

fn split_stamped_name(stem: &str) -> Option<(String, String)> {
    let split = stem.len().checked_sub(STAMP_LEN)?;
    let stamp = stem.get(split..)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;

    let form_name = stem.get(..split)?.trim_end_matches(['_', '-']).to_lowercase();
    let form_name = if form_name.is_empty()
        || form_name == "."
        || form_name == ".."
        || form_name == STAGING_DIR_NAME
    {
        FALLBACK_FORM_NAME.to_string()
    } else {
        form_name
    };

    Some((form_name, stamp.to_string()))
}

fn claim_staging_dir(config: &Config) -> Result<PathBuf, RequestError> {
    let incoming = config.data_dir.join(STAGING_DIR_NAME);
    create_dir_all(&incoming)?;

    let token = Local::now().format(STAMP_FORMAT).to_string();

    Ok(claim_new_dir(&incoming, &token)?)
}

fn claim_new_dir(parent: &Path, stem: &str) -> io::Result<PathBuf> {
    let plain = parent.join(stem);

    match create_dir(&plain) {
        Ok(()) => return Ok(plain),
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
        Err(error) => return Err(error),
    }

    for _ in 0..CLAIM_ATTEMPTS {
        let tagged = parent.join(format!("{stem}-{:04x}", rng().random_range(0..0x10000)));

        match create_dir(&tagged) {
            Ok(()) => return Ok(tagged),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(error) => return Err(error),
        }
    }

    Err(io::Error::other("Could not claim a submission directory"))
}
