use flate2::{Compression, read::GzDecoder, write::GzEncoder};

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Output file, plain or gzip compressed
pub enum FileDescriptor {
    Plain(File),
    Gzip(GzEncoder<File>),
}

impl std::io::Write for FileDescriptor {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(data),
            Self::Gzip(w) => w.write(data),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
        }
    }
}

impl FileDescriptor {
    /// Creates (truncates) `path`
    pub fn create(path: &Path, gzip: bool) -> std::io::Result<Self> {
        let fd = File::create(path)?;

        if gzip {
            let compression = Compression::new(5);
            Ok(Self::Gzip(GzEncoder::new(fd, compression)))
        } else {
            Ok(Self::Plain(fd))
        }
    }

    /// Flushes and terminates the gzip stream, if any
    pub fn finish(self) -> std::io::Result<()> {
        match self {
            Self::Plain(mut w) => std::io::Write::flush(&mut w),
            Self::Gzip(w) => w.finish().map(|_| ()),
        }
    }
}

/// Opens `path` for line reading. Files terminated by `.gz` are decompressed.
pub fn open_reader(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let fd = File::open(path)?;

    let gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(fd))))
    } else {
        Ok(Box::new(BufReader::new(fd)))
    }
}

#[cfg(test)]
mod test {
    use super::{FileDescriptor, open_reader};
    use std::io::{BufRead, Write};

    #[test]
    fn gzip_round() {
        let dir = std::env::temp_dir().join(format!("ppp-timing-fd-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        for (name, gzip) in [("plain.txt", false), ("compressed.txt.gz", true)] {
            let path = dir.join(name);
            let mut fd = FileDescriptor::create(&path, gzip).unwrap();
            writeln!(fd, "first").unwrap();
            writeln!(fd, "second").unwrap();
            fd.finish().unwrap();

            let lines = open_reader(&path)
                .unwrap()
                .lines()
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
            assert_eq!(lines, vec!["first", "second"]);
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
