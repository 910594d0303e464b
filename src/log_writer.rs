use std::{
    fs::{self, File},
    io::{BufWriter, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

#[cfg(not(test))]
mod limits {
    pub const MIN_MAX_BYTES: u64 = 4_096;
}


/// Destination for formatted log lines. One writer runs per handler thread.
pub trait LogWriter {
    fn write_line(&mut self, line: &str);
    fn flush(&mut self);
}

/// Console writer.
#[derive(Default, Debug)]
pub struct LogStdout;

impl LogWriter for LogStdout {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }

    fn flush(&mut self) {
        std::io::stdout().flush().unwrap();
    }
}

/// A log file with fixed-size rotation and a numbered backup chain.
///
/// When a write would push the file past `max_bytes`, the file is renamed
/// to `<name>.1`, existing backups shift up (`<name>.1` -> `<name>.2`, ...)
/// and the backup past `backup_count` is dropped. With `backup_count` of
/// zero the file is truncated in place instead.
pub struct RotatingLogFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: u32,
    file: BufWriter<File>,
    current_size: u64,
}

impl RotatingLogFile {
    pub fn new<P: AsRef<Path>>(
        path: P,
        max_bytes: u64,
        backup_count: u32,
    ) -> Result<Self, std::io::Error> {
        if max_bytes < limits::MIN_MAX_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("max_bytes must be at least {} bytes", limits::MIN_MAX_BYTES),
            ));
        }
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(&path)?;
        let current_size = file.get_ref().metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file,
            current_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        self.current_size + incoming > self.max_bytes
    }

    fn rotate(&mut self) -> Result<(), std::io::Error> {
        self.file.flush()?;
        if self.backup_count > 0 {
            let oldest = self.backup_path(self.backup_count);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
        }
        self.file = BufWriter::new(File::create(&self.path)?);
        self.current_size = 0;
        Ok(())
    }

    fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }
}

impl LogWriter for RotatingLogFile {
    fn write_line(&mut self, line: &str) {
        let incoming = line.len() as u64 + 1;
        if self.should_rotate(incoming) {
            self.rotate().unwrap();
        }
        writeln!(self.file, "{line}").unwrap();
        self.current_size += incoming;
    }

    fn flush(&mut self) {
        self.file.flush().unwrap();
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>, std::io::Error> {
    let mut file = File::options()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.seek(SeekFrom::End(0))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/cfglog_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_plain_append() {
        let dir = test_dir("plain_append");
        let path = dir.join("app.log");
        let mut writer = RotatingLogFile::new(&path, 1024, 3).unwrap();
        writer.write_line("Hello, world!");
        writer.write_line("second line");
        writer.flush();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Hello, world!\nsecond line\n"
        );
    }

    #[test]
    fn test_parent_dir_created() {
        let dir = test_dir("parent_dir");
        let path = dir.join("nested/deeper/app.log");
        let writer = RotatingLogFile::new(&path, 1024, 3).unwrap();
        assert!(writer.path().parent().unwrap().is_dir());
    }

    #[test]
    fn test_rotation_renames_to_backup_chain() {
        let dir = test_dir("backup_chain");
        let path = dir.join("app.log");
        let mut writer = RotatingLogFile::new(&path, 256, 5).unwrap();
        // ~64 bytes per line; 5 lines exceed 256 and force one rotation
        for i in 0..5 {
            writer.write_line(&format!(
                "line{i:02} padded to roughly sixty-four bytes of content......."
            ));
        }
        writer.flush();
        let backup = fs::read_to_string(dir.join("app.log.1")).unwrap();
        let current = fs::read_to_string(&path).unwrap();
        assert!(backup.contains("line00"));
        assert!(backup.contains("line03"));
        assert!(current.contains("line04"));
        assert!(!current.contains("line03"));
    }

    #[test]
    fn test_backup_count_prunes_oldest() {
        let dir = test_dir("backup_prune");
        let path = dir.join("app.log");
        let mut writer = RotatingLogFile::new(&path, 256, 2).unwrap();
        // Enough writes for several rotations
        for i in 0..30 {
            writer.write_line(&format!(
                "line{i:02} padded to roughly sixty-four bytes of content......."
            ));
        }
        writer.flush();
        assert!(path.exists());
        assert!(dir.join("app.log.1").exists());
        assert!(dir.join("app.log.2").exists());
        assert!(!dir.join("app.log.3").exists());
        // All 30 lines cannot survive with only 2 backups
        let mut surviving = String::new();
        for p in [path, dir.join("app.log.1"), dir.join("app.log.2")] {
            surviving.push_str(&fs::read_to_string(p).unwrap());
        }
        assert!(surviving.contains("line29"));
        assert!(!surviving.contains("line00"));
    }

    #[test]
    fn test_zero_backups_truncates_in_place() {
        let dir = test_dir("truncate_in_place");
        let path = dir.join("app.log");
        let mut writer = RotatingLogFile::new(&path, 256, 0).unwrap();
        for i in 0..10 {
            writer.write_line(&format!(
                "line{i:02} padded to roughly sixty-four bytes of content......."
            ));
        }
        writer.flush();
        assert!(!dir.join("app.log.1").exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.len() as u64 <= 256);
        assert!(content.contains("line09"));
    }

    #[test]
    fn test_validation_max_bytes() {
        let dir = test_dir("validation_max_bytes");
        let result = RotatingLogFile::new(dir.join("app.log"), 16, 3);
        assert!(result.is_err());
        let err = result.err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = test_dir("reopen_appends");
        let path = dir.join("app.log");
        {
            let mut writer = RotatingLogFile::new(&path, 1024, 3).unwrap();
            writer.write_line("first run");
            writer.flush();
        }
        let mut writer = RotatingLogFile::new(&path, 1024, 3).unwrap();
        writer.write_line("second run");
        writer.flush();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "first run\nsecond run\n"
        );
    }
}
