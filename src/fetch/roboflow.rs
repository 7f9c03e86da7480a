//! Roboflow Universe export download.

use std::path::PathBuf;

use super::{DatasetProvider, FetchError, FetchRequest};

pub const ROBOFLOW_API: &str = "https://api.roboflow.com";
pub const EXPORT_FORMAT: &str = "yolov8";

/// A Roboflow dataset version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoboflowProject {
    pub workspace: String,
    pub project: String,
    pub version: u32,
}

impl RoboflowProject {
    pub fn new(workspace: &str, project: &str, version: u32) -> Self {
        Self {
            workspace: workspace.to_string(),
            project: project.to_string(),
            version,
        }
    }
}

impl std::fmt::Display for RoboflowProject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} v{}", self.workspace, self.project, self.version)
    }
}

/// Downloads a zipped YOLO export through the Roboflow REST API.
#[derive(Clone, Debug)]
pub struct Roboflow {
    candidates: Vec<RoboflowProject>,
}

impl Default for Roboflow {
    fn default() -> Self {
        Self {
            candidates: vec![
                RoboflowProject::new("mostafinafis", "road-sign-detection-in-bd", 1),
                RoboflowProject::new("bangladesh-traffic-signs", "bangladesh-traffic-signs-v1", 1),
                RoboflowProject::new("thesis-kq02h", "bd-traffic-sign-detection", 1),
                RoboflowProject::new("brssd", "bangladeshi-road-signs", 1),
            ],
        }
    }
}

impl Roboflow {
    pub fn candidates(&self) -> &[RoboflowProject] {
        &self.candidates
    }
}

impl DatasetProvider for Roboflow {
    fn name(&self) -> &str {
        "roboflow"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<PathBuf, FetchError> {
        let Some(api_key) = request.roboflow_api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Err(FetchError::Unavailable(
                "no API key (pass --roboflow-api-key or set ROBOFLOW_API_KEY; \
                 keys are at https://app.roboflow.com/settings/api)"
                    .to_string(),
            ));
        };

        #[cfg(feature = "remote")]
        {
            let mut reasons = Vec::new();
            for candidate in &self.candidates {
                tracing::info!(project = %candidate, "trying Roboflow export");
                match remote::download_export(candidate, api_key, &request.output_dir) {
                    Ok(()) => return Ok(request.output_dir.clone()),
                    Err(reason) => reasons.push(format!("{candidate}: {reason}")),
                }
            }
            Err(FetchError::CandidatesFailed(reasons))
        }

        #[cfg(not(feature = "remote"))]
        {
            let _ = api_key;
            Err(FetchError::Unavailable(
                "built without the 'remote' feature".to_string(),
            ))
        }
    }
}

#[cfg(feature = "remote")]
mod remote {
    use std::fs::{self, File};
    use std::io;
    use std::path::Path;
    use std::time::Duration;

    use serde_json::Value;
    use url::Url;

    use super::{RoboflowProject, EXPORT_FORMAT, ROBOFLOW_API};

    const ARCHIVE_NAME: &str = "roboflow_export.zip";

    pub(super) fn export_url(project: &RoboflowProject, api_key: &str) -> Result<Url, String> {
        let mut url = Url::parse(&format!(
            "{}/{}/{}/{}/{}",
            ROBOFLOW_API, project.workspace, project.project, project.version, EXPORT_FORMAT
        ))
        .map_err(|source| source.to_string())?;
        url.query_pairs_mut().append_pair("api_key", api_key);
        Ok(url)
    }

    pub(super) fn export_link(body: &Value) -> Option<&str> {
        body.get("export")
            .and_then(|export| export.get("link"))
            .and_then(Value::as_str)
    }

    pub(super) fn download_export(
        project: &RoboflowProject,
        api_key: &str,
        output_dir: &Path,
    ) -> Result<(), String> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(600)))
            .build();
        let agent: ureq::Agent = config.into();

        let url = export_url(project, api_key)?;
        let mut response = agent
            .get(url.as_str())
            .call()
            .map_err(|source| source.to_string())?;
        let body = response
            .body_mut()
            .read_json::<Value>()
            .map_err(|source| source.to_string())?;

        let link = export_link(&body)
            .ok_or_else(|| "response did not contain an export link".to_string())?;

        fs::create_dir_all(output_dir).map_err(|source| source.to_string())?;
        let archive_path = output_dir.join(ARCHIVE_NAME);

        let mut response = agent.get(link).call().map_err(|source| source.to_string())?;
        {
            let mut file = File::create(&archive_path).map_err(|source| source.to_string())?;
            io::copy(&mut response.body_mut().as_reader(), &mut file)
                .map_err(|source| source.to_string())?;
        }

        let extracted = extract_archive(&archive_path, output_dir);
        if let Err(err) = fs::remove_file(&archive_path) {
            tracing::debug!(error = %err, "could not remove downloaded archive");
        }
        extracted
    }

    pub(super) fn extract_archive(archive_path: &Path, output_dir: &Path) -> Result<(), String> {
        let file = File::open(archive_path).map_err(|source| source.to_string())?;
        let mut archive = zip::ZipArchive::new(file).map_err(|source| source.to_string())?;
        archive
            .extract(output_dir)
            .map_err(|source| source.to_string())?;
        tracing::debug!(entries = archive.len(), dir = %output_dir.display(), "extracted export");
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_unavailable() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let request = FetchRequest {
            output_dir: temp.path().join("BRSSD"),
            roboflow_api_key: None,
        };
        let err = Roboflow::default().fetch(&request).unwrap_err();
        assert!(matches!(err, FetchError::Unavailable(_)));
    }

    #[test]
    fn default_candidates_end_with_brssd() {
        let roboflow = Roboflow::default();
        assert_eq!(roboflow.candidates().len(), 4);
        assert_eq!(
            roboflow.candidates()[3],
            RoboflowProject::new("brssd", "bangladeshi-road-signs", 1)
        );
    }
}
