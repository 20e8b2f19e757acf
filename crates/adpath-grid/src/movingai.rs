//! Readers for the MovingAI grid benchmark formats: `.map` files and `.scen` scenario files.

use std::fs::File;
use std::io::{BufRead, BufReader, Error, Result};
use std::path::{Path, PathBuf};

use crate::bitgrid::is_traversable_char;
use crate::BitGrid;

/// One start/goal query of a scenario.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    pub bucket: u32,
    pub start: (i32, i32),
    pub goal: (i32, i32),
    /// Optimal 8-connected path length with diagonal moves costing √2, as listed in the file.
    pub optimal: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    /// Map file the problems refer to, resolved relative to the scenario file when it exists there.
    pub map: PathBuf,
    pub problems: Vec<Problem>,
}

pub fn read_scenario(scen_path: &Path) -> Result<Scenario> {
    let (map, problems) = parse_scenario(BufReader::new(File::open(scen_path)?))?;
    Ok(Scenario {
        map: locate_map(&map, scen_path)?,
        problems,
    })
}

pub fn read_bitgrid(map: &Path) -> Result<BitGrid> {
    parse_bitgrid(BufReader::new(File::open(map)?))
}

/// Parses the body of a scenario file. Returns the map name as written and the problems.
pub fn parse_scenario(reader: impl BufRead) -> Result<(String, Vec<Problem>)> {
    let mut lines = reader.lines();
    check_version(lines.next().transpose()?)?;

    let mut map: Option<(String, (i32, i32))> = None;
    let mut problems = vec![];

    for line in lines {
        let line = line?;
        let mut tokens = line.split_whitespace();

        let Some(bucket) = tokens.next() else {
            continue;
        };
        let bucket = bucket.parse().map_err(Error::other)?;

        let problem_map = tokens
            .next()
            .ok_or_else(|| Error::other("problem missing field map"))?;

        let mut next_int = |field: &str| -> Result<i32> {
            tokens
                .next()
                .ok_or_else(|| Error::other(format!("problem missing field {field}")))?
                .parse()
                .map_err(Error::other)
        };

        let size = (next_int("map width")?, next_int("map height")?);
        let start = (next_int("start x")?, next_int("start y")?);
        let goal = (next_int("goal x")?, next_int("goal y")?);

        let optimal = tokens
            .next()
            .ok_or_else(|| Error::other("problem missing field optimal length"))?
            .parse()
            .map_err(Error::other)?;

        match &map {
            Some((name, _)) if name != problem_map => {
                return Err(Error::other("problem specifies different map"));
            }
            Some((_, map_size)) if *map_size != size => {
                return Err(Error::other("problem specifies incorrect map size"));
            }
            Some(_) => {}
            None => map = Some((problem_map.to_owned(), size)),
        }

        problems.push(Problem {
            bucket,
            start,
            goal,
            optimal,
        });
    }

    let (map, _) = map.ok_or_else(|| Error::other("scenario contains no problems"))?;
    Ok((map, problems))
}

/// Parses an `octile` map file.
pub fn parse_bitgrid(reader: impl BufRead) -> Result<BitGrid> {
    let mut lines = reader.lines();
    let mut next_line = || -> Result<String> {
        lines
            .next()
            .transpose()?
            .ok_or_else(|| Error::other("unexpected end of file"))
    };

    let line = next_line()?;
    let kind = field(&line, "type")?;
    if kind != "octile" {
        return Err(Error::other(format!("unsupported map type {kind}")));
    }
    let height = field(&next_line()?, "height")?.parse().map_err(Error::other)?;
    let width = field(&next_line()?, "width")?.parse().map_err(Error::other)?;
    if next_line()?.trim() != "map" {
        return Err(Error::other("expected map token"));
    }

    let mut map = BitGrid::new(width, height);

    for (y, row) in lines.enumerate() {
        let row = row?;
        if y as i32 >= map.height() {
            if row.trim().is_empty() {
                continue;
            }
            return Err(Error::other("too many lines of map"));
        }
        for (x, cell) in row.trim_end().chars().enumerate() {
            if x as i32 >= map.width() {
                return Err(Error::other("too many columns of map"));
            }
            map.set(x as i32, y as i32, is_traversable_char(cell));
        }
    }

    Ok(map)
}

fn locate_map(map_path: &str, scen_path: &Path) -> Result<PathBuf> {
    if let Some(dir) = scen_path.parent() {
        let beside = dir.join(map_path);
        if beside.try_exists()? {
            return Ok(beside);
        }
    }
    Ok(Path::new(map_path).to_path_buf())
}

/// Value of a `name value` line.
fn field<'a>(line: &'a str, name: &str) -> Result<&'a str> {
    let mut tokens = line.split_whitespace();
    let (Some(key), Some(value), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(Error::other(format!("expected `{name} <value>`, got {line:?}")));
    };
    if key != name {
        return Err(Error::other(format!("expected {name}, got {key}")));
    }
    Ok(value)
}

fn check_version(version_line: Option<String>) -> Result<()> {
    let line = version_line.ok_or_else(|| Error::other("unexpected end of file"))?;
    let number = field(&line, "version")?;
    if number != "1" && number != "1.0" {
        return Err(Error::other(format!("unsupported version number: {number}")));
    }
    Ok(())
}
