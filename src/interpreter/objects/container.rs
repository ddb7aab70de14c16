//! Container contents, capacity limits and aggregate queries
use crate::interpreter::core::instruction::Aword;
use crate::interpreter::objects::world::World;

impl World {
    /// Objects directly inside `cnt`, in id order
    pub fn contents(&self, cnt: Aword) -> Vec<Aword> {
        self.ranges
            .objects
            .ids()
            .zip(self.objects.iter())
            .filter(|(_, o)| o.location == cnt)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn count_in(&self, cnt: Aword) -> usize {
        self.objects.iter().filter(|o| o.location == cnt).count()
    }

    /// Sum of `attr` over everything inside `cnt`, including nested contents
    pub fn sum_in(&self, attr: Aword, cnt: Aword) -> Result<Aword, String> {
        let mut sum: Aword = 0;
        for id in self.contents(cnt) {
            if self.is_container(id) {
                sum = sum.wrapping_add(self.sum_in(attr, id)?);
            }
            sum = sum.wrapping_add(self.attribute(id, attr)?);
        }
        Ok(sum)
    }

    /// The statements of the first limit of `cnt` that `obj` would break.
    /// Only one rejection is reported per attempt.
    pub fn violated_limit(&self, cnt: Aword, obj: Aword) -> Result<Option<Aword>, String> {
        let container = self.container(cnt)?;
        for limit in &container.limits {
            let broken = if limit.attribute == 0 {
                self.count_in(cnt) as Aword >= limit.bound
            } else {
                let total = self
                    .sum_in(limit.attribute, cnt)?
                    .wrapping_add(self.attribute(obj, limit.attribute)?);
                total as i32 > limit.bound as i32
            };
            if broken {
                return Ok(Some(limit.statements));
            }
        }
        Ok(None)
    }

    /// Objects counted by the aggregate operators: for a location every
    /// object whose `where` it is, otherwise the direct contents.
    fn aggregate_members(&self, whr: Aword) -> Result<Vec<Aword>, String> {
        if self.ranges.is_location(whr) {
            let mut members = Vec::new();
            for id in self.ranges.objects.ids() {
                if self.where_is(id)? == whr {
                    members.push(id);
                }
            }
            Ok(members)
        } else {
            Ok(self.contents(whr))
        }
    }

    pub fn aggregate_sum(&self, attr: Aword, whr: Aword) -> Result<Aword, String> {
        self.aggregate_members(whr)?
            .into_iter()
            .try_fold(0 as Aword, |sum, id| {
                Ok(sum.wrapping_add(self.attribute(id, attr)?))
            })
    }

    pub fn aggregate_max(&self, attr: Aword, whr: Aword) -> Result<Aword, String> {
        let mut max: Option<i32> = None;
        for id in self.aggregate_members(whr)? {
            let value = self.attribute(id, attr)? as i32;
            max = Some(max.map_or(value, |m| m.max(value)));
        }
        Ok(max.unwrap_or(0) as Aword)
    }

    pub fn aggregate_count(&self, whr: Aword) -> Result<Aword, String> {
        Ok(self.aggregate_members(whr)?.len() as Aword)
    }
}
